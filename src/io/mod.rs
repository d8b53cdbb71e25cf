//! Input/output helpers.
//!
//! - text/CSV ingest + validation (`ingest`)
//! - CSV exports (`export`)
//! - estimate JSON read/write (`estimate_file`)

pub mod estimate_file;
pub mod export;
pub mod ingest;

pub use estimate_file::*;
pub use export::*;
pub use ingest::*;
