//! Offline-first synchronization: conflict resolution, remote store
//! abstraction, and the driver that ties them to local persistence.

mod driver;
mod remote;
mod resolver;

pub use driver::{ConflictLog, LocalStore, SyncReport, Synchronizer};
pub use remote::{MemoryRemoteStore, RemoteStore};
pub use resolver::{resolve, ConflictResolver, LastWriteWins, Resolution};
