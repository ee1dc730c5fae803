use std::{fmt::Display, str::FromStr};

use crate::commands::CommandError;

use super::invalid_argument;

pub const MAX_SLUG_LENGTH: usize = 32;

/// The short name of an event used in commands, e.g. `OfficeSanta2024`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSlug(String);

impl FromStr for EventSlug {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(invalid_argument("The event slug is empty.".to_string()));
        }

        if s.len() > MAX_SLUG_LENGTH {
            return Err(invalid_argument(format!(
                "The event slug is too long: it can be at most {MAX_SLUG_LENGTH} characters."
            )));
        }

        let is_valid = s
            .chars()
            .all(|c| matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_'));

        if is_valid {
            Ok(EventSlug(s.to_string()))
        } else {
            Err(invalid_argument(format!("Invalid event slug: `{}`.\nIt can only contain a-z, A-Z, 0-9, a dash (-) or an underscore (_).", s.escape_default())))
        }
    }
}

impl From<EventSlug> for String {
    fn from(value: EventSlug) -> Self {
        value.0
    }
}

impl Display for EventSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
