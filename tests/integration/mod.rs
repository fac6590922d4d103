// Integration tests for framework lifecycle (TAS-42)
mod conditional_approval_workflow;
mod diamond_workflow;
mod linear_workflow;
mod mixed_dag_workflow;
mod order_fulfillment;
mod sql_functions;
mod tree_workflow;
