//! Graph store abstraction and the bundled implementations

mod command;
mod mock;
mod traits;

pub use command::CommandStore;
pub use mock::MockStore;
pub use traits::{GraphStore, StoreError, StoreResult};
