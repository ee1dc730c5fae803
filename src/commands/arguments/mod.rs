use super::{user_err, CommandError};

mod event_slug;
mod human_datetime;
mod human_duration;
mod trimmed_string;

pub use event_slug::{EventSlug, MAX_SLUG_LENGTH};
pub use human_datetime::HumanDateTime;
pub use human_duration::HumanDuration;
pub use trimmed_string::TrimmedString;

pub fn invalid_argument(message: String) -> CommandError {
    user_err(message)
}
