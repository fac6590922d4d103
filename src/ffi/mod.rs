pub mod c_api;
pub mod python;
pub mod ruby;
pub mod shared;

// Re-export shared components for easy access
pub use shared::*;
