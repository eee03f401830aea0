//! # Duolog Persist
//!
//! Durable layout for evaluation runs, conversation logs, and comparison
//! reports. Records are write-once, read-many: the stores expose no
//! update or delete operations, and saving to an existing key fails.
//!
//! The [`StorageBackend`] trait keys JSON values; [`MemoryBackend`] backs
//! tests and ephemeral deployments, [`FsBackend`] writes one JSON file
//! per record under a data directory. Typed stores ([`RunStore`],
//! [`LogStore`], [`ComparisonStore`]) own the `run:` / `log:` /
//! `comparison:` key spaces.

pub mod backend;
pub mod comparison_store;
pub mod fs;
pub mod log_store;
pub mod run_store;

pub use backend::{MemoryBackend, StorageBackend, StorageError, StorageExt};
pub use comparison_store::ComparisonStore;
pub use fs::FsBackend;
pub use log_store::LogStore;
pub use run_store::RunStore;
