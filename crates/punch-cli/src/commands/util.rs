//! Shared helpers for command output.

use chrono::Duration;

/// Formats an elapsed duration as zero-padded `HH:MM:SS`.
///
/// Hours keep growing past 24. Negative durations clamp to zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}
