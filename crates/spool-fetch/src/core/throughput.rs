use std::time::Duration;

/// Achieved transfer rate of a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub bytes:         u64,
    pub elapsed:       Duration,
    pub bytes_per_sec: f64,
    /// Rate fell short of the configured floor.
    pub below_target:  bool,
}

/// Compute `bytes / elapsed` and compare it with `min_bps`.
///
/// A zero elapsed time counts as an unbounded rate, so it is never below target. The
/// result is telemetry only; it has no say in whether the download succeeded.
///
/// ```
/// use std::time::Duration;
/// use spool_fetch::evaluate_throughput;
///
/// let t = evaluate_throughput(1024 * 1024, Duration::from_secs(4), 400 * 1024);
/// assert_eq!(t.bytes_per_sec, 262_144.0);
/// assert!(t.below_target);
/// ```
pub fn evaluate_throughput(bytes: u64, elapsed: Duration, min_bps: u64) -> Throughput {
    let secs = elapsed.as_secs_f64();
    let bytes_per_sec = if secs > 0.0 {
        bytes as f64 / secs
    } else {
        f64::INFINITY
    };

    Throughput {
        bytes,
        elapsed,
        bytes_per_sec,
        below_target: bytes_per_sec < min_bps as f64,
    }
}
