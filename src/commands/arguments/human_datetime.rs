use std::str::FromStr;

use lazy_regex::regex_captures;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::commands::CommandError;

const EXAMPLE_1: &str = "2024-12-20 18:00 UTC+3";
const EXAMPLE_2: &str = "20.12.2024";

fn invalid_argument(message: String) -> CommandError {
    super::invalid_argument(format!(
        "{message}\nDatetime examples: `{EXAMPLE_1}`, `{EXAMPLE_2}`."
    ))
}

/// A point in time as typed by a member: any of date, time and UTC offset,
/// in any order. At least a date or a time is required.
#[derive(PartialEq, Eq, Debug)]
pub struct HumanDateTime {
    date: Option<Date>,
    time: Option<Time>,
    utc_offset: Option<UtcOffset>,
}

impl HumanDateTime {
    /// Fills in whatever the member left out, relative to `now`.
    ///
    /// A missing offset means UTC and a missing time means midnight. A bare
    /// time refers to its next occurrence, so `09:00` typed in the evening
    /// means tomorrow morning.
    pub fn materialize(&self, now: OffsetDateTime) -> OffsetDateTime {
        let offset = self.utc_offset.unwrap_or(UtcOffset::UTC);
        let local_now = now.to_offset(offset);

        let date = self.date.unwrap_or(local_now.date());
        let time = self.time.unwrap_or(Time::MIDNIGHT);

        let materialized = PrimitiveDateTime::new(date, time).assume_offset(offset);

        if self.date.is_none() && materialized <= now {
            materialized + Duration::days(1)
        } else {
            materialized
        }
    }
}

fn number<T: FromStr>(digits: &str, what: &str) -> Result<T, CommandError> {
    digits
        .parse()
        .map_err(|_| invalid_argument(format!("Invalid {what}: `{digits}`.")))
}

fn calendar_date(token: &str, year: &str, month: &str, day: &str) -> Result<Date, CommandError> {
    let month = Month::try_from(number::<u8>(month, "month")?)
        .map_err(|_| invalid_argument(format!("Invalid month: `{month}`.")))?;

    Date::from_calendar_date(number(year, "year")?, month, number(day, "day")?)
        .map_err(|_| invalid_argument(format!("Invalid date: `{token}`.")))
}

/// `2024-12-20` or `20.12.2024`.
fn parse_date(token: &str) -> Result<Option<Date>, CommandError> {
    if let Some((_, year, month, day)) = regex_captures!(r"^(\d{4})-(\d{2})-(\d{2})$", token) {
        return calendar_date(token, year, month, day).map(Some);
    }

    if let Some((_, day, month, year)) = regex_captures!(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$", token)
    {
        return calendar_date(token, year, month, day).map(Some);
    }

    Ok(None)
}

/// `18:00` or `18:00:30`.
fn parse_time(token: &str) -> Result<Option<Time>, CommandError> {
    let Some((_, hour, minute, second)) =
        regex_captures!(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$", token)
    else {
        return Ok(None);
    };

    let second = if second.is_empty() {
        0
    } else {
        number(second, "second")?
    };

    Time::from_hms(number(hour, "hour")?, number(minute, "minute")?, second)
        .map(Some)
        .map_err(|_| invalid_argument(format!("Invalid time: `{token}`.")))
}

/// `UTC`, `UTC+3`, `UTC-2:30`.
fn parse_offset(token: &str) -> Result<Option<UtcOffset>, CommandError> {
    let Some((_, sign, hour, minute)) =
        regex_captures!(r"^(?i:utc)(?:([+-])(\d{1,2})(?::(\d{2}))?)?$", token)
    else {
        return Ok(None);
    };

    if sign.is_empty() {
        return Ok(Some(UtcOffset::UTC));
    }

    let sign: i8 = if sign == "+" { 1 } else { -1 };
    let hour: i8 = number(hour, "hour")?;
    let minute: i8 = if minute.is_empty() {
        0
    } else {
        number(minute, "minute")?
    };

    UtcOffset::from_hms(sign * hour, sign * minute, 0)
        .map(Some)
        .map_err(|_| invalid_argument(format!("Invalid UTC offset: `{token}`.")))
}

fn set_once<T>(slot: &mut Option<T>, value: T, what: &str, token: &str) -> Result<(), CommandError> {
    if slot.is_some() {
        return Err(invalid_argument(format!("Duplicate {what}: `{token}`.")));
    }

    *slot = Some(value);
    Ok(())
}

impl FromStr for HumanDateTime {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut date = None;
        let mut time = None;
        let mut utc_offset = None;

        for token in s.split_whitespace() {
            if let Some(value) = parse_date(token)? {
                set_once(&mut date, value, "date", token)?;
            } else if let Some(value) = parse_time(token)? {
                set_once(&mut time, value, "time", token)?;
            } else if let Some(value) = parse_offset(token)? {
                set_once(&mut utc_offset, value, "UTC offset", token)?;
            } else {
                return Err(invalid_argument(format!("Invalid token: `{token}`.")));
            }
        }

        if date.is_none() && time.is_none() {
            return Err(invalid_argument(
                "Neither date nor time is provided.".to_string(),
            ));
        }

        Ok(HumanDateTime {
            date,
            time,
            utc_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use time::{
        macros::{date, datetime, offset, time},
        Date, Time, UtcOffset,
    };

    use super::{HumanDateTime, EXAMPLE_1, EXAMPLE_2};

    fn parsed(date: Option<Date>, time: Option<Time>, utc_offset: Option<UtcOffset>) -> HumanDateTime {
        HumanDateTime {
            date,
            time,
            utc_offset,
        }
    }

    #[test]
    fn examples_parse() {
        assert_eq!(
            HumanDateTime::from_str(EXAMPLE_1).unwrap(),
            parsed(Some(date!(2024-12-20)), Some(time!(18:00)), Some(offset!(+3)))
        );
        assert_eq!(
            HumanDateTime::from_str(EXAMPLE_2).unwrap(),
            parsed(Some(date!(2024-12-20)), None, None)
        );
    }

    #[test]
    fn accepted_forms() {
        let cases = [
            (
                "2023-02-15 14:37:22 UTC+7",
                parsed(Some(date!(2023-02-15)), Some(time!(14:37:22)), Some(offset!(+7))),
            ),
            (
                "2023-02-15 14:37 UTC-2:30",
                parsed(Some(date!(2023-02-15)), Some(time!(14:37)), Some(offset!(-2:30))),
            ),
            (
                "1.3.2024 9:05",
                parsed(Some(date!(2024-03-01)), Some(time!(9:05)), None),
            ),
            (
                "utc 31.12.2024",
                parsed(Some(date!(2024-12-31)), None, Some(UtcOffset::UTC)),
            ),
            ("00:59 UTC-10:30", parsed(None, Some(time!(0:59)), Some(offset!(-10:30)))),
            ("12:32:47", parsed(None, Some(time!(12:32:47)), None)),
        ];

        for (input, expected) in cases {
            assert_eq!(HumanDateTime::from_str(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn rejected_forms() {
        for input in [
            "UTC+2",
            "",
            "2024-13-01",
            "31.02.2024",
            "25:00",
            "2024-12-20 2024-12-21",
            "18:00 19:00",
            "tomorrow",
            "UTC+30",
        ] {
            assert!(HumanDateTime::from_str(input).is_err(), "{input}");
        }
    }

    #[test]
    fn materialize_full() {
        let now = datetime!(2024-12-01 10:00 UTC);

        assert_eq!(
            HumanDateTime::from_str(EXAMPLE_1).unwrap().materialize(now),
            datetime!(2024-12-20 15:00 UTC)
        );
    }

    #[test]
    fn materialize_date_only() {
        let now = datetime!(2024-12-01 10:00 UTC);

        assert_eq!(
            HumanDateTime::from_str(EXAMPLE_2).unwrap().materialize(now),
            datetime!(2024-12-20 00:00 UTC)
        );
    }

    #[test]
    fn materialize_bare_time() {
        let now = datetime!(2024-12-01 10:00 UTC);

        assert_eq!(
            HumanDateTime::from_str("18:30").unwrap().materialize(now),
            datetime!(2024-12-01 18:30 UTC)
        );
        assert_eq!(
            HumanDateTime::from_str("09:00").unwrap().materialize(now),
            datetime!(2024-12-02 09:00 UTC)
        );
    }

    #[test]
    fn materialize_time_uses_local_date() {
        // 23:00 UTC is already the next day in UTC+3.
        let now = datetime!(2024-12-01 23:00 UTC);

        assert_eq!(
            HumanDateTime::from_str("12:00 UTC+3").unwrap().materialize(now),
            datetime!(2024-12-02 09:00 UTC)
        );
    }
}
