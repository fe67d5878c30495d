//! Module archive creation and inspection
//!
//! Archives are gzip'd tarballs whose entries all live under one top-level
//! `author-name-version/` directory, the layout module tools expect.

pub mod create;
pub mod read;

// Re-export main items
pub use create::{Archiver, TarGzArchiver, METADATA_FILE};
pub use read::{list_entries, read_archive_file};
