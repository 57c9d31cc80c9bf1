pub mod mem;
pub mod paging;
pub mod persistent;
pub mod seed;
pub mod snapshot;
pub mod traits;
pub mod wal;

pub use mem::InMemoryStore;
pub use paging::{apply_specification, list_paged};
pub use persistent::PersistentStore;
pub use traits::*;
