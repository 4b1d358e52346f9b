pub mod jsonl;
pub mod snapshot;

pub use jsonl::flush_to_jsonl;
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
