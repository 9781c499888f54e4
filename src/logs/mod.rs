//! Run logs: durable storage and live tailing

pub mod store;
pub mod tail;

pub use store::LogStore;
pub use tail::LogTailer;
