mod change;
mod entity_store;
mod snapshot;

pub use change::{StoreChange, StoreOp};
pub use entity_store::EntityStore;
pub use snapshot::Snapshot;
