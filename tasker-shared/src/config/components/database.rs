// TAS-50: Database configuration component
//
// TAS-61 Phase 6C/6D: Updated to use V2 configuration

pub use crate::config::tasker::tasker_v2::{
    DatabaseConfig,
    DatabaseVariablesConfig as DatabaseVariables,
    PoolConfig as DatabasePoolConfig,
};
