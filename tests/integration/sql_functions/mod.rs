// SQL function boundary condition tests
mod retry_boundary_tests;

// DLQ (Dead Letter Queue) function tests (TAS-49)
mod dlq_functions_test;

// Analytics aggregated function tests (TAS-168)
mod analytics_aggregated_tests;
