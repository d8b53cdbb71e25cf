//! Reporting: localized labels and formatted terminal output.

pub mod format;
pub mod labels;

pub use format::*;
pub use labels::*;
