//! Display helpers for the text report

/// Format a microsecond duration with an adaptive unit
///
/// ```
/// use tracelens::format::format_duration;
///
/// assert_eq!(format_duration(0.0), "0 μs");
/// assert_eq!(format_duration(250.0), "250 μs");
/// assert_eq!(format_duration(1500.0), "1.500 ms");
/// assert_eq!(format_duration(2_000_000.0), "2.000 s");
/// ```
pub fn format_duration(micros: f64) -> String {
    if micros == 0.0 || !micros.is_finite() {
        return "0 μs".to_string();
    }

    let ms = micros / 1000.0;
    let s = ms / 1000.0;
    if s >= 1.0 {
        format!("{:.3} s", s)
    } else if ms >= 1.0 {
        format!("{:.3} ms", ms)
    } else {
        format!("{:.0} μs", micros)
    }
}

/// Format a byte count using 1024-based units
pub fn format_bytes(bytes: f64) -> String {
    if bytes == 0.0 || !bytes.is_finite() {
        return "0 B".to_string();
    }

    let kb = bytes / 1024.0;
    let mb = kb / 1024.0;
    let gb = mb / 1024.0;
    if gb >= 1.0 {
        format!("{:.2} GB", gb)
    } else if mb >= 1.0 {
        format!("{:.2} MB", mb)
    } else if kb >= 1.0 {
        format!("{:.2} KB", kb)
    } else {
        format!("{:.0} B", bytes)
    }
}

/// `value` as a share of `total`, one decimal
pub fn format_percentage(value: f64, total: f64) -> String {
    if total == 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", value / total * 100.0)
}

/// Shorten to at most `max_len` characters, ending in `...`
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
