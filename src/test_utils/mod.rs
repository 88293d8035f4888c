//! Shared helpers for unit tests
mod common;
mod recording;

pub use common::*;
pub use recording::*;
