//! Shared utilities for the HLS crates.
mod errors;
mod out_file;

pub use errors::{Error, HlsResult};
pub use out_file::OutputFile;
