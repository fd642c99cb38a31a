//! Duration conversions and display strings.
//!
//! Settings store durations in milliseconds; the engines count whole
//! seconds. Everything here is total: out-of-domain inputs are clamped,
//! never rejected.

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;

/// Milliseconds to whole seconds (floor).
pub fn to_seconds(ms: u64) -> u64 {
    ms / MS_PER_SECOND
}

pub fn minutes_to_ms(minutes: u64) -> u64 {
    minutes.saturating_mul(MS_PER_MINUTE)
}

/// Milliseconds to minutes, rounded to the nearest minute.
pub fn ms_to_minutes(ms: u64) -> u64 {
    (ms.saturating_add(MS_PER_MINUTE / 2)) / MS_PER_MINUTE
}

/// Format seconds as `MM:SS`, or `H:MM:SS` when `force_hours` is set or the
/// value reaches one hour.
pub fn format_clock(seconds: u64, force_hours: bool) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if force_hours || hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Parse the output of [`format_clock`] back into seconds.
///
/// Accepts `MM:SS` and `H:MM:SS`; minute and second fields must be below 60
/// when an hour field is present.
pub fn parse_clock(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let field = |s: &str| -> Option<u64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };

    match parts.as_slice() {
        [m, s] => {
            let (m, s) = (field(m)?, field(s)?);
            if s >= 60 {
                return None;
            }
            m.checked_mul(60)?.checked_add(s)
        }
        [h, m, s] => {
            let (h, m, s) = (field(h)?, field(m)?, field(s)?);
            if m >= 60 || s >= 60 {
                return None;
            }
            h.checked_mul(3600)?.checked_add(m * 60 + s)
        }
        _ => None,
    }
}

/// `part / total` as a percentage in `[0, 100]`.
///
/// Returns 0 when `total` is 0.
pub fn progress_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = part as f64 / total as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Human-readable duration, e.g. "1 hour 30 minutes".
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    fn unit(n: u64, name: &str) -> String {
        if n == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    match (hours, minutes) {
        (0, 0) => unit(seconds, "second"),
        (0, m) => unit(m, "minute"),
        (h, 0) => unit(h, "hour"),
        (h, m) => format!("{} {}", unit(h, "hour"), unit(m, "minute")),
    }
}
