use std::str::FromStr;

use time::Duration;

use crate::commands::CommandError;

const EXAMPLE_1: &str = "14 days 12 hours";
const EXAMPLE_2: &str = "2w 3d";

/// Longest accepted duration. Nobody ships a gift for a year.
pub const MAX_DURATION: Duration = Duration::days(365);

const UNITS: &[(&[&str], Duration)] = &[
    (&["w", "week", "weeks"], Duration::WEEK),
    (&["d", "day", "days"], Duration::DAY),
    (&["h", "hr", "hour", "hours"], Duration::HOUR),
    (&["m", "min", "mins", "minute", "minutes"], Duration::MINUTE),
];

fn invalid_argument(message: String) -> CommandError {
    super::invalid_argument(format!(
        "{message}\nDuration examples: `{EXAMPLE_1}`, `{EXAMPLE_2}`."
    ))
}

/// A positive duration written like `2 weeks 3d`.
#[derive(Debug)]
pub struct HumanDuration(Duration);

impl From<HumanDuration> for Duration {
    fn from(value: HumanDuration) -> Self {
        value.0
    }
}

fn unit_length(unit: &str) -> Option<Duration> {
    UNITS
        .iter()
        .find(|(names, _)| names.contains(&unit))
        .map(|(_, length)| *length)
}

/// Splits `"2w 3 days"` into `[("2", "w"), ("3", "days")]`.
fn components(s: &str) -> Result<Vec<(&str, &str)>, CommandError> {
    let mut components = vec![];
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(invalid_argument(format!(
                "Expected a number, got `{}`.",
                rest.split_ascii_whitespace().next().unwrap_or(rest)
            )));
        }
        let (number, after_number) = rest.split_at(number_end);

        let after_number = after_number.trim_start();
        let unit_end = after_number
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after_number.len());
        if unit_end == 0 {
            return Err(invalid_argument(format!("`{number}` is missing a time unit.")));
        }
        let (unit, after_unit) = after_number.split_at(unit_end);

        components.push((number, unit));
        rest = after_unit.trim_start();
    }

    Ok(components)
}

impl FromStr for HumanDuration {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || c.is_ascii_whitespace()))
        {
            return Err(invalid_argument(format!(
                "Invalid character in duration: `{}`.",
                c.escape_default()
            )));
        }

        let lowercase = s.to_ascii_lowercase();
        let mut duration = Duration::ZERO;

        for (number, unit) in components(&lowercase)? {
            let count: u16 = number
                .parse()
                .map_err(|_| invalid_argument(format!("`{number}` is too large.")))?;
            let length = unit_length(unit)
                .ok_or_else(|| invalid_argument(format!("Unknown time unit: `{unit}`.")))?;

            duration += length * count as u32;

            if duration > MAX_DURATION {
                return Err(invalid_argument(format!(
                    "The duration can be at most {} days.",
                    MAX_DURATION.whole_days()
                )));
            }
        }

        if duration.is_zero() {
            return Err(invalid_argument("The duration must be longer than zero.".to_string()));
        }

        Ok(HumanDuration(duration))
    }
}
