//! Test-only root package. See `tests/` for the cross-crate integration suite.
