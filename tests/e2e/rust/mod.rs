mod api_client_endpoints_test; // TAS-70: API client endpoint coverage
mod batch_processing_csv_workflow;
mod batch_processing_workflow;
mod batch_resumption_test;
mod conditional_approval_rust;
mod diamond_decision_batch_workflow;
mod diamond_workflow;
mod domain_event_publishing_test; // TAS-65: Domain event publishing
mod ecommerce_order_test; // TAS-91 Blog Post 01
mod linear_workflow;
mod mixed_dag_workflow;
mod order_fulfillment;
mod resolver_tests; // TAS-93 Phase 5
mod retry_mechanics_test;
mod simple_integration_tests;
mod tree_workflow;
