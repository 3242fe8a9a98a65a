//! Unit tests module

mod api_test;
mod audit_test;
mod config_test;
mod statements_test;
mod util_test;
