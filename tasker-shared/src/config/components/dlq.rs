// TAS-49: Dead Letter Queue (DLQ) and Lifecycle Configuration Components
//
// Re-exports V2 canonical DLQ configuration types for backward compatibility.
// New code should import directly from tasker_v2.

pub use crate::config::tasker::tasker_v2::{
    DlqOperationsConfig, DlqReasons, StalenessActions, StalenessDetectionConfig,
    StalenessThresholds,
};

// Type alias for backward compatibility
// Old code using `DlqConfig` will now use `DlqOperationsConfig`
pub type DlqConfig = DlqOperationsConfig;
