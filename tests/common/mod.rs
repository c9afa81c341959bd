#![allow(dead_code)]

pub use maildirlearn_test_utils::builders;
pub use maildirlearn_test_utils::fake_channel;
pub use maildirlearn_test_utils::fake_classifier;
pub use maildirlearn_test_utils::{init_tracing, with_timeout};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
