//! gRPC service implementations.
//!
//! Each service implementation delegates to the existing service layer,
//! providing type conversions and error mapping.

pub mod analytics;
pub mod config;
pub mod dlq;
pub mod health;
pub mod steps;
pub mod tasks;
pub mod templates;

pub use analytics::AnalyticsServiceImpl;
pub use config::ConfigServiceImpl;
pub use dlq::DlqServiceImpl;
pub use health::HealthServiceImpl;
pub use steps::StepServiceImpl;
pub use tasks::TaskServiceImpl;
pub use templates::TemplateServiceImpl;
