//! On-disk JSON snapshots of the whole keyspace.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotWriter, load, load_from_reader};
