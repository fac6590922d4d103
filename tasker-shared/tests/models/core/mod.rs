// task_annotation - these tables removed from schema
pub mod named_step;
pub mod named_task;
pub mod named_tasks_named_step;
pub mod step_dag_relationship;
pub mod step_readiness_status;
pub mod task;
pub mod task_execution_context;
pub mod task_namespace;
pub mod task_transition;
pub mod workflow_step;
pub mod workflow_step_edge;
pub mod workflow_step_transition;
