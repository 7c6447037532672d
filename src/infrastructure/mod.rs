//! Adapters implementing the domain's capability ports.

pub mod fs_sink;
pub mod in_memory;
pub mod notify;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod score;
