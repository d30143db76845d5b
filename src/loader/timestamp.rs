use super::LoadError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Read a timestamp string as an absolute instant.
///
/// Accepts RFC 3339 with `Z` or a numeric offset, `T` or a space between
/// date and time, and optional fractional seconds. Naive timestamps and
/// bare dates are taken as UTC.
pub fn normalize_to_instant(text: &str) -> Result<DateTime<Utc>, LoadError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LoadError::Timestamp(text.to_string()));
    }

    // 2025-11-28 10:00:00+00 → 2025-11-28T10:00:00+00
    let mut candidate = trimmed.to_string();
    if candidate.len() > 10 && candidate.as_bytes()[10] == b' ' {
        candidate.replace_range(10..11, "T");
    }
    if let Some(stripped) = candidate.strip_suffix('z') {
        candidate = format!("{}Z", stripped);
    }
    let candidate = expand_short_offset(&candidate);

    if let Ok(instant) = DateTime::parse_from_rfc3339(&candidate) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&candidate, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(LoadError::Timestamp(text.to_string()))
}

/// `+03` / `-0530` → `+03:00` / `-05:30` so RFC 3339 parsing accepts them.
fn expand_short_offset(candidate: &str) -> String {
    let Some(time_start) = candidate.find('T') else {
        return candidate.to_string();
    };
    let Some(sign_pos) = candidate[time_start..].rfind(['+', '-']).map(|p| p + time_start) else {
        return candidate.to_string();
    };

    let (head, offset) = candidate.split_at(sign_pos);
    let digits = &offset[1..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return candidate.to_string();
    }
    let sign = &offset[..1];
    match digits.len() {
        2 => format!("{}{}{}:00", head, sign, digits),
        4 => format!("{}{}{}:{}", head, sign, &digits[..2], &digits[2..]),
        _ => candidate.to_string(),
    }
}
