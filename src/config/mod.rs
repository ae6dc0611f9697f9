//! Configuration model for gitlock.
//!
//! This module defines the Config struct that represents `.gitlock.yaml` at
//! the repository root. The file is optional and meant to be committed so
//! the whole team shares it. Unknown fields are ignored for forward
//! compatibility and every field has a default.

mod model;
mod operations;

#[cfg(test)]
mod tests;

pub use model::{CONFIG_FILE_NAME, Config};
