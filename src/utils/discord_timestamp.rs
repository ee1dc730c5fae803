use std::fmt::Display;

use time::OffsetDateTime;

/// How a Discord client renders a `<t:...>` timestamp in the reader's timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `20 April 2021 16:20`
    ShortDateTime,
    /// `Tuesday, 20 April 2021 16:20`
    LongDateTime,
    /// `in 3 days`, `2 hours ago`
    RelativeTime,
}

impl Display for TimestampStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = match self {
            TimestampStyle::ShortDateTime => "f",
            TimestampStyle::LongDateTime => "F",
            TimestampStyle::RelativeTime => "R",
        };

        f.write_str(suffix)
    }
}

pub fn timestamp(datetime: impl Into<OffsetDateTime>, style: TimestampStyle) -> String {
    let unix_timestamp = datetime.into().unix_timestamp();
    format!("<t:{unix_timestamp}:{style}>")
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{timestamp, TimestampStyle};

    #[test]
    fn markup() {
        let christmas = datetime!(2024-12-25 00:00 UTC);

        assert_eq!(
            timestamp(christmas, TimestampStyle::ShortDateTime),
            "<t:1735084800:f>"
        );
        assert_eq!(
            timestamp(christmas, TimestampStyle::RelativeTime),
            "<t:1735084800:R>"
        );
    }
}
