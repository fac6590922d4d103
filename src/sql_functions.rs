//! # SQL Functions Documentation
//!
//! This module provides comprehensive documentation for all PostgreSQL functions
//! used by the Tasker Core workflow orchestration system.
//!
//! ## Overview
//!
//! The Tasker system relies on 8 sophisticated SQL functions for real-time computation
//! of workflow state, analytics, and orchestration decisions. These functions eliminate
//! the need for stored data and provide always-current information.
//!
//! ## Function Categories
//!
//! ### Orchestration Functions
//! - `get_task_execution_context` - Single task execution status
//! - `get_task_execution_contexts_batch` - Batch task execution status  
//! - `get_step_readiness_status` - Step dependency readiness
//!
//! ### Analytics Functions
//! - `get_analytics_metrics_v01` - System-wide performance metrics
//! - `get_system_health_counts_v01` - System health and capacity
//! - `get_slowest_steps_v01` - Step performance analysis
//! - `get_slowest_tasks_v01` - Task performance analysis
//! - `get_max_connections_v01` - Database connection limits
//!
//! ## Performance Characteristics
//!
//! All functions are optimized for:
//! - **Sub-second response times** for typical workloads
//! - **Efficient indexing** leveraging existing table indexes
//! - **Minimal memory usage** with streaming results
//! - **Concurrent execution** with proper locking strategies

/// # Task Execution Context Functions
///
/// These functions provide real-time task execution status and statistics.
pub mod task_execution {
    //! Task execution context and status computation.

    /// Get execution context for a single task.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_task_execution_context(input_task_id bigint)
    /// RETURNS TABLE(
    ///   task_id bigint,
    ///   named_task_id integer,
    ///   status text,
    ///   total_steps bigint,
    ///   pending_steps bigint,
    ///   in_progress_steps bigint,
    ///   completed_steps bigint,
    ///   failed_steps bigint,
    ///   ready_steps bigint,
    ///   execution_status text,
    ///   recommended_action text,
    ///   completion_percentage numeric,
    ///   health_status text
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function acts as a "task dashboard" - imagine you're monitoring a complex
    /// manufacturing process and need to know the current status of one production line.
    /// The function tells you:
    ///
    /// - **Overall Progress**: "7 out of 10 steps complete (70%)"
    /// - **Current Activity**: "2 steps currently running"
    /// - **Readiness**: "3 steps ready to start"
    /// - **Problems**: "1 step failed and needs attention"
    /// - **Next Action**: "retry_failed_steps" or "continue_processing"
    ///
    /// ## Implementation Details
    ///
    /// The function uses a sophisticated CTE (Common Table Expression) structure:
    ///
    /// 1. **Step Analysis**: Calls `get_step_readiness_status()` for comprehensive step data
    /// 2. **Task State**: Joins with `tasker_task_transitions` for current task status
    /// 3. **Statistical Aggregation**: Uses conditional aggregation for step counts
    /// 4. **Health Computation**: Calculates execution status and recommended actions
    /// 5. **Progress Metrics**: Computes completion percentage and health indicators
    ///
    /// ## Performance Profile
    ///
    /// - **Complexity**: O(S + E) where S = steps in task, E = dependency edges
    /// - **Typical Response**: 10-50ms for tasks with 10-100 steps
    /// - **Memory Usage**: Constant - single result row
    /// - **Concurrent Safety**: Read-only, no locking required
    ///
    /// ## Usage Examples
    ///
    /// ```sql
    /// -- Get status for task 12345
    /// SELECT * FROM get_task_execution_context(12345);
    ///
    /// -- Check if task has ready steps
    /// SELECT ready_steps > 0 as has_work
    /// FROM get_task_execution_context(12345);
    ///
    /// -- Get completion percentage
    /// SELECT completion_percentage || '%' as progress
    /// FROM get_task_execution_context(12345);
    /// ```
    ///
    /// ## Error Conditions
    ///
    /// - **Non-existent Task**: Returns empty result set (no rows)
    /// - **Invalid Task ID**: Returns empty result set (no rows)
    /// - **Database Errors**: Propagates PostgreSQL errors (connection, syntax, etc.)
    ///
    /// ## Related Functions
    ///
    /// - `get_task_execution_contexts_batch` - Batch version for multiple tasks
    /// - `get_step_readiness_status` - Underlying step analysis
    pub fn get_task_execution_context() {}

    /// Get execution contexts for multiple tasks in a single query.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_task_execution_contexts_batch(input_task_ids bigint[])
    /// RETURNS TABLE(
    ///   task_id bigint,
    ///   named_task_id integer,
    ///   status text,
    ///   total_steps bigint,
    ///   pending_steps bigint,
    ///   in_progress_steps bigint,
    ///   completed_steps bigint,
    ///   failed_steps bigint,
    ///   ready_steps bigint,
    ///   execution_status text,
    ///   recommended_action text,
    ///   completion_percentage numeric,
    ///   health_status text
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This is like getting a "fleet dashboard" - instead of checking one production line,
    /// you're monitoring multiple production lines simultaneously. Perfect for:
    ///
    /// - **Operations Dashboard**: Show status of all active workflows
    /// - **Batch Processing**: Analyze hundreds of tasks efficiently
    /// - **System Overview**: Get high-level view of system activity
    ///
    /// ## Performance Advantages
    ///
    /// **vs. Multiple Single Calls:**
    /// - **Network Efficiency**: 1 database round trip vs N round trips
    /// - **Query Optimization**: Shared CTEs and optimized JOINs
    /// - **Resource Usage**: Single connection vs N connections
    /// - **Cache Efficiency**: Better PostgreSQL plan caching
    /// - **Typical Speedup**: 5-10x faster for batches of 50+ tasks
    ///
    /// ## Implementation Strategy
    ///
    /// 1. **Array Processing**: Uses PostgreSQL array operations for efficient task filtering
    /// 2. **Shared CTEs**: Common table expressions shared across all tasks
    /// 3. **Batch Aggregation**: Single pass aggregation for all tasks
    /// 4. **Optimized JOINs**: Minimized JOIN operations with strategic indexing
    ///
    /// ## Usage Examples
    ///
    /// ```sql
    /// -- Get status for multiple tasks
    /// SELECT * FROM get_task_execution_contexts_batch(ARRAY[123, 456, 789]);
    ///
    /// -- Dashboard view with filtering
    /// SELECT task_id, execution_status, completion_percentage
    /// FROM get_task_execution_contexts_batch(ARRAY[123, 456, 789])
    /// WHERE execution_status != 'complete';
    /// ```
    pub fn get_task_execution_contexts_batch() {}
}

/// # Step Readiness Analysis Functions
///
/// Functions for analyzing step dependencies and execution readiness.
pub mod step_readiness {
    //! Step dependency analysis and readiness computation.

    /// Analyze step dependencies and readiness for execution.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_step_readiness_status(input_task_id bigint)
    /// RETURNS TABLE(
    ///   workflow_step_id bigint,
    ///   task_id bigint,
    ///   named_step_id integer,
    ///   current_status text,
    ///   is_ready boolean,
    ///   blocking_dependencies text[],
    ///   dependency_count integer,
    ///   satisfied_dependencies integer,
    ///   can_execute boolean,
    ///   priority_score numeric
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function is like a "traffic controller" for your workflow steps. It determines
    /// which steps can "go" (execute) and which must "wait" (blocked by dependencies).
    ///
    /// Think of it as managing a complex assembly line where:
    /// - **Ready Steps**: "Green light - can start immediately"
    /// - **Blocked Steps**: "Red light - waiting for dependencies"
    /// - **Dependency Analysis**: "Shows which upstream steps must complete first"
    ///
    /// ## Core Logic
    ///
    /// 1. **Dependency Mapping**: Analyzes `tasker_workflow_step_edges` for step relationships
    /// 2. **Status Resolution**: Checks current step states from transitions
    /// 3. **Readiness Calculation**: Determines if all dependencies are satisfied
    /// 4. **Priority Scoring**: Assigns priority based on dependency depth and criticality
    ///
    /// ## Usage Examples
    ///
    /// ```sql
    /// -- Find all ready steps for a task
    /// SELECT workflow_step_id, current_status
    /// FROM get_step_readiness_status(12345)
    /// WHERE is_ready = true;
    ///
    /// -- Analyze blocking dependencies
    /// SELECT workflow_step_id, blocking_dependencies
    /// FROM get_step_readiness_status(12345)
    /// WHERE is_ready = false;
    /// ```
    pub fn get_step_readiness_status() {}
}

/// # Analytics and Monitoring Functions
///
/// Functions for system-wide analytics, performance monitoring, and health analysis.
pub mod analytics {
    //! System analytics and performance monitoring functions.

    /// Get comprehensive system analytics and performance metrics.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_analytics_metrics_v01(since_timestamp timestamp with time zone)
    /// RETURNS TABLE(
    ///   active_tasks_count bigint,
    ///   total_namespaces_count bigint,
    ///   unique_task_types_count bigint,
    ///   system_health_score numeric,
    ///   task_throughput bigint,
    ///   completion_count bigint,
    ///   error_count bigint,
    ///   completion_rate numeric,
    ///   error_rate numeric,
    ///   avg_task_duration numeric,
    ///   avg_step_duration numeric,
    ///   step_throughput bigint,
    ///   analysis_period_start timestamp with time zone,
    ///   calculated_at timestamp with time zone
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function provides a "system health dashboard" - comprehensive vital signs
    /// for your entire workflow orchestration system. It answers:
    ///
    /// - **"Is my system healthy?"** (Health score 0-100)
    /// - **"How busy are we?"** (Active tasks and throughput)
    /// - **"Are we performing well?"** (Completion rates and durations)
    /// - **"Any problems?"** (Error rates and failure analysis)
    ///
    /// ## Example Output Interpretation
    ///
    /// ```text
    /// System Health Score: 87/100 (Good)
    /// Active Tasks: 1,247 currently running
    /// Task Throughput: 156 tasks/hour
    /// Completion Rate: 94.2% (excellent)
    /// Error Rate: 2.1% (acceptable)
    /// Avg Task Duration: 8.5 minutes
    /// ```
    pub fn get_analytics_metrics_v01() {}

    /// Get system health counts and capacity metrics.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_system_health_counts_v01()
    /// RETURNS TABLE(
    ///   total_tasks bigint,
    ///   pending_tasks bigint,
    ///   in_progress_tasks bigint,
    ///   complete_tasks bigint,
    ///   error_tasks bigint,
    ///   cancelled_tasks bigint,
    ///   total_steps bigint,
    ///   pending_steps bigint,
    ///   in_progress_steps bigint,
    ///   complete_steps bigint,
    ///   error_steps bigint,
    ///   retryable_error_steps bigint,
    ///   exhausted_retry_steps bigint,
    ///   in_backoff_steps bigint,
    ///   active_connections bigint,
    ///   max_connections bigint
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function provides "mission control" counts - real-time counts of everything
    /// happening in your system. Like air traffic control showing every plane and status.
    ///
    /// Perfect for:
    /// - **Capacity Planning**: "Are we approaching limits?"
    /// - **Resource Monitoring**: "Connection pool utilization"
    /// - **Workload Analysis**: "Distribution of work across states"
    pub fn get_system_health_counts_v01() {}

    /// Get slowest performing steps for optimization analysis.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_slowest_steps_v01(limit_count integer DEFAULT 50)
    /// RETURNS TABLE(
    ///   named_step_id integer,
    ///   step_name text,
    ///   avg_duration_seconds numeric,
    ///   max_duration_seconds numeric,
    ///   min_duration_seconds numeric,
    ///   execution_count bigint,
    ///   total_duration_seconds numeric,
    ///   performance_score numeric
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function identifies your "bottleneck steps" - the steps that take the longest
    /// time to execute. It's like finding the slowest stations on an assembly line.
    ///
    /// Perfect for:
    /// - **Performance Optimization**: "Which steps should I optimize first?"
    /// - **Resource Allocation**: "Where should I add more computing power?"
    /// - **Architecture Review**: "Which steps need redesign?"
    pub fn get_slowest_steps_v01() {}

    /// Get slowest performing tasks for optimization analysis.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_slowest_tasks_v01(limit_count integer DEFAULT 50)
    /// RETURNS TABLE(
    ///   named_task_id integer,
    ///   task_name text,
    ///   avg_duration_seconds numeric,
    ///   max_duration_seconds numeric,
    ///   min_duration_seconds numeric,
    ///   execution_count bigint,
    ///   total_duration_seconds numeric,
    ///   performance_score numeric
    /// )
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function identifies your "slowest workflows" - the complete workflows that
    /// take the longest time from start to finish. It's like finding the longest routes
    /// in a delivery system.
    pub fn get_slowest_tasks_v01() {}

    /// Get maximum database connection limit.
    ///
    /// ## Function Signature
    /// ```sql
    /// get_max_connections_v01()
    /// RETURNS bigint
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This function returns the PostgreSQL `max_connections` setting, which determines
    /// the maximum number of concurrent database connections allowed. Essential for
    /// capacity planning and connection pool sizing.
    pub fn get_max_connections_v01() {}
}

/// # SQL Views Documentation
///
/// Documentation for SQL views used in the system.
pub mod views {
    //! SQL view definitions and usage.

    /// Step DAG (Directed Acyclic Graph) relationship analysis view.
    ///
    /// ## View Definition
    /// ```sql
    /// CREATE VIEW tasker_step_dag_relationships AS
    /// SELECT
    ///   workflow_step_id,
    ///   task_id,
    ///   named_step_id,
    ///   parent_step_ids,        -- JSONB array of parent step IDs
    ///   child_step_ids,         -- JSONB array of child step IDs
    ///   parent_count,           -- Count of parent dependencies
    ///   child_count,            -- Count of child dependencies
    ///   is_root_step,           -- True if no parents (entry point)
    ///   is_leaf_step,           -- True if no children (exit point)
    ///   min_depth_from_root     -- Minimum depth from root steps
    /// FROM [complex CTE analysis]
    /// ```
    ///
    /// ## Human-Readable Explanation
    ///
    /// This view provides a "relationship map" for workflow steps, showing how steps
    /// depend on each other in a directed acyclic graph (DAG). It's like a family tree
    /// for your workflow steps.
    ///
    /// Key insights:
    /// - **Root Steps**: Steps with no parents (can start immediately)
    /// - **Leaf Steps**: Steps with no children (final steps)
    /// - **Dependency Chains**: How steps connect to each other
    /// - **Execution Depth**: How far each step is from the beginning
    ///
    /// ## Performance Characteristics
    ///
    /// - **No Storage**: Computed view with no table maintenance
    /// - **Always Current**: Real-time calculation ensures accuracy
    /// - **Efficient**: Leverages indexes on workflow_step_edges
    /// - **Recursive**: Uses CTEs for depth calculation
    pub fn tasker_step_dag_relationships() {}
}

/// # Integration Examples
///
/// Real-world examples of how to use these functions together.
pub mod examples {
    //! Integration examples and common patterns.

    /// Example: Complete task monitoring dashboard
    ///
    /// ```sql
    /// -- Get comprehensive task status with analytics
    /// WITH task_contexts AS (
    ///   SELECT * FROM get_task_execution_contexts_batch(ARRAY[123, 456, 789])
    /// ),
    /// system_health AS (
    ///   SELECT * FROM get_system_health_counts_v01()
    /// ),
    /// analytics AS (
    ///   SELECT * FROM get_analytics_metrics_v01(NOW() - INTERVAL '1 hour')
    /// )
    /// SELECT
    ///   tc.task_id,
    ///   tc.execution_status,
    ///   tc.completion_percentage,
    ///   tc.ready_steps,
    ///   sh.active_connections,
    ///   a.system_health_score
    /// FROM task_contexts tc
    /// CROSS JOIN system_health sh
    /// CROSS JOIN analytics a;
    /// ```
    pub fn dashboard_example() {}

    /// Example: Performance optimization analysis
    ///
    /// ```sql
    /// -- Find bottlenecks in slow tasks
    /// WITH slow_tasks AS (
    ///   SELECT * FROM get_slowest_tasks_v01(10)
    /// ),
    /// slow_steps AS (
    ///   SELECT * FROM get_slowest_steps_v01(20)
    /// )
    /// SELECT
    ///   st.task_name,
    ///   st.avg_duration_seconds as task_avg_duration,
    ///   ss.step_name,
    ///   ss.avg_duration_seconds as step_avg_duration,
    ///   ss.performance_score
    /// FROM slow_tasks st
    /// JOIN slow_steps ss ON true
    /// ORDER BY st.avg_duration_seconds DESC, ss.avg_duration_seconds DESC;
    /// ```
    pub fn performance_analysis_example() {}

    /// Example: System capacity monitoring
    ///
    /// ```sql
    /// -- Monitor system capacity and health
    /// SELECT
    ///   h.active_connections,
    ///   h.max_connections,
    ///   ROUND(h.active_connections * 100.0 / h.max_connections, 2) as connection_utilization_pct,
    ///   h.in_progress_tasks + h.in_progress_steps as active_work_items,
    ///   h.pending_tasks + h.pending_steps as queued_work_items,
    ///   CASE
    ///     WHEN h.active_connections * 100.0 / h.max_connections > 90 THEN 'CRITICAL'
    ///     WHEN h.active_connections * 100.0 / h.max_connections > 75 THEN 'WARNING'
    ///     ELSE 'OK'
    ///   END as capacity_status
    /// FROM get_system_health_counts_v01() h;
    /// ```
    pub fn capacity_monitoring_example() {}
}
