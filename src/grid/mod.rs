//! # Embedded Data Grid Substrate
//!
//! In-process implementation of the key-value substrate the orchestration
//! engine runs against: named maps with atomic per-key read-modify-write
//! (`invoke`), ordered per-key change notification with (old, new, cause),
//! per-entry expiry, and a locality/recovery surface for simulating partition
//! ownership transfer.
//!
//! All engine state (task records, assignments, executor registry, task
//! properties) lives in these maps; records sharing a task-id are colocated by
//! construction, so multi-key sequences stay cheap and the engine's
//! idempotent-step tolerance (no cross-key transactions) holds trivially.

pub mod event;
pub mod map;

pub use event::{EntryEvent, EventCause, EventKind};
pub use map::{GridMap, MapEntry};
