use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable byte size using base-1024 units, rounded to two decimals
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    format!("{} {}", trim_decimals(&format!("{:.2}", value)), SIZE_UNITS[unit])
}

/// Bytes expressed as kilobytes with exactly two decimals, as shown in duplicate notices
pub fn format_kilobytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0)
}

fn trim_decimals(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Short date and time in the local zone, e.g. `Jan 5, 2024, 03:07 PM`
pub fn format_date(timestamp: &str) -> String {
    format_date_in(timestamp, &Local)
}

pub fn format_date_in<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    const SHORT: &str = "%b %-d, %Y, %I:%M %p";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.with_timezone(tz).format(SHORT).to_string();
    }

    // No offset given: the timestamp is wall-clock time in `tz`
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| tz.from_local_datetime(&naive).single())
        .map(|local| local.format(SHORT).to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1 MB");
        assert_eq!(format_file_size(1073741824), "1 GB");
        assert_eq!(format_file_size(1234567), "1.18 MB");
    }

    #[test]
    fn sizes_past_gigabytes_stay_in_gigabytes() {
        assert_eq!(format_file_size(2 * 1024 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn kilobytes_keep_two_decimals() {
        assert_eq!(format_kilobytes(2048), "2.00");
        assert_eq!(format_kilobytes(1536), "1.50");
    }

    #[test]
    fn dates_render_short() {
        assert_eq!(format_date_in("2024-01-05T15:07:00Z", &Utc), "Jan 5, 2024, 03:07 PM");
        assert_eq!(format_date_in("2024-11-20T09:30:15.123456+00:00", &Utc), "Nov 20, 2024, 09:30 AM");
    }

    #[test]
    fn dates_follow_the_target_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_date_in("2024-01-05T23:30:00Z", &plus_two), "Jan 6, 2024, 01:30 AM");
    }

    #[test]
    fn dates_without_offset_are_local_wall_time() {
        assert_eq!(format_date_in("2024-01-05T15:07:00.123456", &Utc), "Jan 5, 2024, 03:07 PM");
        assert_eq!(format_date_in("2024-01-05T09:30:00", &Utc), "Jan 5, 2024, 09:30 AM");

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_date_in("2024-01-05T23:30:00", &plus_two), "Jan 5, 2024, 11:30 PM");
    }

    #[test]
    fn unparseable_dates() {
        assert_eq!(format_date_in("yesterday", &Utc), "Invalid Date");
        assert_eq!(format_date_in("2024-13-05T15:07:00", &Utc), "Invalid Date");
    }
}
