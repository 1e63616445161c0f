use crate::foundation::core::TimeMs;
use crate::foundation::error::{SsbError, SsbResult};

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Parse an SSB timestamp `[[H:]MM:]SS.mmm` into milliseconds.
///
/// The millisecond field (1-3 digits) is mandatory and read as an integer. Minutes and seconds
/// are at most 59; they take exactly two digits unless they lead the timestamp, where one digit
/// is also accepted. Hours take any number of digits.
pub fn parse_time(s: &str) -> SsbResult<TimeMs> {
    let invalid = || SsbError::parse(format!("invalid timestamp \"{s}\""));

    let (clock, millis) = s.rsplit_once('.').ok_or_else(invalid)?;
    let ms = digits(millis, 1, 3).ok_or_else(invalid)?;

    let fields: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [sec] => (None, None, *sec),
        [min, sec] => (None, Some(*min), *sec),
        [hour, min, sec] => (Some(*hour), Some(*min), *sec),
        _ => return Err(invalid()),
    };

    let sec_min_width = if minutes.is_none() { 1 } else { 2 };
    let sec = digits(seconds, sec_min_width, 2)
        .filter(|v| *v <= 59)
        .ok_or_else(invalid)?;
    let min = match minutes {
        Some(m) => {
            let min_width = if hours.is_none() { 1 } else { 2 };
            digits(m, min_width, 2)
                .filter(|v| *v <= 59)
                .ok_or_else(invalid)?
        }
        None => 0,
    };
    let hour = match hours {
        Some(h) => digits(h, 1, usize::MAX).ok_or_else(invalid)?,
        None => 0,
    };

    hour.checked_mul(MS_PER_HOUR)
        .and_then(|v| v.checked_add(min * MS_PER_MINUTE + sec * MS_PER_SECOND + ms))
        .ok_or_else(invalid)
}

/// Format milliseconds as `H:MM:SS.mmm`.
pub fn format_time(ms: TimeMs) -> String {
    format!(
        "{}:{:02}:{:02}.{:03}",
        ms / MS_PER_HOUR,
        ms % MS_PER_HOUR / MS_PER_MINUTE,
        ms % MS_PER_MINUTE / MS_PER_SECOND,
        ms % MS_PER_SECOND
    )
}

fn digits(s: &str, min_len: usize, max_len: usize) -> Option<u64> {
    if s.len() < min_len || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
#[path = "../../tests/unit/script/time.rs"]
mod tests;
