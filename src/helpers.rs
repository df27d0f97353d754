use std::time::Duration;

/// Splits a control line at its first space into verb and argument.
///
/// The argument is everything after that space, untouched; it is empty when the
/// line has no space.
pub fn split_command_line(line: &str) -> (&str, &str) {
    line.split_once(' ').unwrap_or((line, ""))
}

/// Human readable throughput for transfer logs.
pub fn transfer_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return format!("{} bytes", bytes);
    }
    let per_sec = bytes as f64 / secs;
    if per_sec >= 1_048_576.0 {
        format!("{:.2} MB/s", per_sec / 1_048_576.0)
    } else if per_sec >= 1_024.0 {
        format!("{:.2} KB/s", per_sec / 1_024.0)
    } else {
        format!("{:.0} B/s", per_sec)
    }
}
