//! fibseq CLI internals, exposed as a library for integration tests.

pub mod app;
pub mod config;
pub mod errors;
pub mod validate;
