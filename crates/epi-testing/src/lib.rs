//! `epi-testing` — a testing facility with opening hours and turnaround.
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`facility`] | `Testing` model, `TestingConfig`, `TestPredicate`      |
//!
//! A test is requested through `epi_model::channels::TEST_REQUESTED`.  The
//! request is accepted only while the facility is open; the result becomes
//! available on the first tick after a ready tick drawn uniformly between
//! `t + duration` and the last tick that starts before closing time.

pub mod facility;


pub use facility::{Testing, TestingConfig, TestPredicate, infection_predicate, new_positives};

/// Names of the columns owned by the testing model.
pub mod columns {
    /// `bool`
    pub const TEST_IN_PROCESS: &str = "test_in_process";
    /// `Option<Tick>`: ready tick of the test in process.
    pub const TEST_READY: &str = "test_ready";
    /// `bool`: last reported result, `true` is positive.
    pub const TEST_RESULT: &str = "test_result";
    /// `bool`
    pub const TEST_RESULTS_AVAILABLE: &str = "test_results_available";
    /// `Option<Tick>`: tick the last result became available.
    pub const TEST_RESULT_TIME: &str = "test_result_time";
    /// `u32`
    pub const NUM_TESTS: &str = "num_tests";
}
