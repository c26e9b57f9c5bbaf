//! Integration tests against a mock admin panel

mod sync_tests;
