/// Converts a `minutes.seconds` game clock value into whole seconds.
///
/// The part after the dot is a plain seconds count, not a decimal fraction:
/// `12.34` is 12 minutes 34 seconds and `0.5` is five seconds. A value
/// without a dot is read as whole minutes.
pub fn parse_time(s: &str) -> Option<u32> {
    let s = s.trim();
    let (minutes, seconds) = s.split_once('.').unwrap_or((s, ""));

    let minutes = parse_clock_part(minutes)?;
    let seconds = parse_clock_part(seconds)?;

    minutes.checked_mul(60)?.checked_add(seconds)
}

fn parse_clock_part(s: &str) -> Option<u32> {
    if s.is_empty() {
        return Some(0);
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Ultiorganizer pads names with non-breaking spaces; normalise them so the
/// same player spelled in two tables maps to the same key.
pub fn clean_text(s: &str) -> String {
    s.replace('\u{a0}', " ").trim().to_string()
}
