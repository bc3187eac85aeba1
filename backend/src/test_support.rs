//! Test utilities for the careline crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

mod clock;
mod harness;
mod scripted_ai;

pub use clock::MutableClock;
pub use harness::{TEST_JWT_SECRET, TestHarness};
pub use scripted_ai::ScriptedAiSource;
