//! Birth-time display formatting.

/// Convert a 24-hour `HH:MM` value into `H:MM AM/PM`.
///
/// Values that already carry an AM/PM marker are returned unchanged, and so is
/// anything that does not parse as two in-range integers.
pub fn format_time(raw: &str) -> String {
    let upper = raw.to_ascii_uppercase();
    if upper.contains("AM") || upper.contains("PM") {
        return raw.to_string();
    }

    match parse_hours_minutes(raw) {
        Some((hours, minutes)) => {
            let suffix = if hours < 12 { "AM" } else { "PM" };
            let display_hours = match hours % 12 {
                0 => 12,
                h => h,
            };
            format!("{display_hours}:{minutes:02} {suffix}")
        }
        None => raw.to_string(),
    }
}

fn parse_hours_minutes(raw: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}
