//! Built-in and synthetic stability data.

pub mod sample;

pub use sample::*;
