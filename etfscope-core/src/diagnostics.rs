//! Timing wrappers.
//!
//! Wrap any closure to get a start event and a finish event carrying the
//! elapsed time in seconds.

use std::time::Instant;

/// Run `f`, logging when it starts and finishes and how long it took.
pub fn stopwatch<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let (out, _) = timed(label, f);
    out
}

/// Like [`stopwatch`], also returning the elapsed seconds.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> (T, f64) {
    tracing::info!(task = label, "started");
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed().as_secs_f64();
    tracing::info!(task = label, elapsed_secs = %format!("{elapsed:.4}"), "finished");
    (out, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_returns_closure_value() {
        assert_eq!(stopwatch("add", || 2 + 2), 4);
    }

    #[test]
    fn timed_reports_non_negative_elapsed() {
        let (out, secs) = timed("sleep", || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            "done"
        });
        assert_eq!(out, "done");
        assert!(secs >= 0.005);
    }
}
