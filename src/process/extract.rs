// src/process/extract.rs

use regex::Regex;

/// Hour:minute pair separated by a hyphen, an en-dash or "à", anywhere in
/// the text. Hours may be one or two digits; minutes are exactly two.
pub const TIME_RANGE_PATTERN: &str =
    r"(?P<start>\d{1,2}:\d{2})\s*[-–à]\s*(?P<end>\d{1,2}:\d{2})";

/// Pull a `(start, end)` time-of-day pair out of free text like
/// `"08:00-16:30"` or `"22:00 à 06:00"`.
///
/// The substrings come back exactly as matched; turning them into real
/// timestamps is the builder's job. `None` means no usable range, which
/// callers record as missing rather than treat as a failure.
pub fn extract_time_range<'t>(pattern: &Regex, text: &'t str) -> Option<(&'t str, &'t str)> {
    let caps = pattern.captures(text)?;
    match (caps.name("start"), caps.name("end")) {
        (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
        _ => None,
    }
}
