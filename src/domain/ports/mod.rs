//! Port trait definitions (Hexagonal Architecture)
//!
//! The collaborators verification depends on but does not implement:
//! - SnapshotSource: reads value copies of a named collection
//! - EntityWriter: applies a mutation to one entity
//! - StabilityCheck: opaque "is the system settled" probe
//! - Clock: monotonic time and sleeping
//!
//! Adapters for a concrete orchestrator live outside this crate; the only
//! adapter shipped here is the tokio-backed clock.

pub mod clock;
pub mod entity_writer;
pub mod errors;
pub mod snapshot_source;
pub mod stability_check;

pub use clock::Clock;
pub use entity_writer::EntityWriter;
pub use errors::AccessError;
pub use snapshot_source::SnapshotSource;
pub use stability_check::StabilityCheck;
