/*!
 * Utility modules for common functionality used across the TaskerCore codebase.
 *
 * This module provides reusable utilities that are used by multiple components
 * throughout the system, helping to avoid code duplication and maintain
 * consistency.
 */

pub mod serde;
