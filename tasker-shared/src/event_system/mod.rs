pub mod deployment;
pub mod event_driven;

pub use deployment::{DeploymentMode, DeploymentModeError, DeploymentModeHealthStatus};
pub use event_driven::{
    EventContext, EventDrivenSystem, EventSystemBaseConfig, EventSystemFactory,
    EventSystemNotification, EventSystemStatistics, SystemStatistics,
};
