use time::macros::format_description;
use time::{format_description, OffsetDateTime, UtcOffset};

use super::{timestamp, TimestampStyle};

const DATETIME_FORMAT: &[format_description::FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn format_utc(date_time: impl Into<OffsetDateTime>) -> String {
    date_time
        .into()
        .to_offset(UtcOffset::UTC)
        .format(DATETIME_FORMAT)
        .expect("Hard-coded format should be correct")
}

pub fn format_local(date_time: impl Into<OffsetDateTime>) -> String {
    timestamp(date_time, TimestampStyle::ShortDateTime)
}

/// A deadline shown in the reader's timezone, with UTC as a fallback for
/// clients that don't render timestamps.
pub fn format_deadline(date_time: impl Into<OffsetDateTime>) -> String {
    let date_time = date_time.into();

    format!(
        "{} your time ({} UTC, {})",
        format_local(date_time),
        format_utc(date_time),
        timestamp(date_time, TimestampStyle::RelativeTime)
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{format_deadline, format_utc};

    #[test]
    fn utc_ignores_the_source_offset() {
        assert_eq!(format_utc(datetime!(2024-12-10 18:00 +1)), "2024-12-10 17:00");
    }

    #[test]
    fn deadline_has_every_rendering() {
        assert_eq!(
            format_deadline(datetime!(2024-12-25 00:00 UTC)),
            "<t:1735084800:f> your time (2024-12-25 00:00 UTC, <t:1735084800:R>)"
        );
    }
}
