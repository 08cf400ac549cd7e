//! On-disk persistence for the Index (§4.1, §6): wire codec, atomic
//! read/write, and advisory cross-process locking.

pub mod codec;
pub mod persistence;

pub use persistence::{load, load_borrowed, save, with_exclusive_lock, LoadedIndex, INDEX_FILE_NAME, LOCK_FILE_NAME};
