pub mod firestore;
pub mod memory;
pub mod traits;

pub use firestore::FirestoreFeed;
pub use memory::MemoryFeed;
pub use traits::{ImageFeed, SnapshotStream};
