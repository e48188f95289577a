//! Shared fixtures live under `tests/support`; this crate only hosts tests.
