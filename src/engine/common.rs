// src/engine/common.rs
//
// Panic policy around FFI codec calls. mozjpeg aborts via panic on some
// malformed inputs; batch workers must see an error, not a crash.

use crate::error::{FitError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

pub fn run_with_panic_policy<T>(stage: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(FitError::internal(format!("{stage} panicked: {message}")))
        }
    }
}
