//! Shared utilities.

pub mod hash;

#[cfg(all(test, unix))]
pub mod testutil;
