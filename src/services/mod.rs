//! Service layer: the poller, the indexed lookup, the supervisor and the
//! operations composed from them.

pub mod indexed_ops;
pub mod lookup;
pub mod poller;
pub mod stability;
pub mod supervisor;

pub use indexed_ops::{eventually_unique_by_index, unique_by_index, update_unique_by_index};
pub use lookup::find_unique_by_index;
pub use poller::{ErrorPolicy, Poller};
pub use stability::{await_stability, await_stability_with, ensure_steady};
pub use supervisor::Supervisor;
