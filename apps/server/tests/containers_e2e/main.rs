//! Test result container E2E test suite.
//!
//! Drives the HTTP API against a real PostgreSQL database.
//! Requires a running PostgreSQL database reachable through DATABASE_URL;
//! every test is skipped when DATABASE_URL is not set.
//!
//! Run with: cargo test --test containers_e2e

mod test_helpers;

mod test_create;
mod test_lookup;
mod test_update_delete;
