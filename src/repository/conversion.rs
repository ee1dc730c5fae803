use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use thiserror::Error;
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::models::{
    types::UtcDateTime, EventId, EventStatus, FeedbackId, GiftConfirmationId, MessageId, PairId,
    ParticipantId, Rating, ReminderKind,
};

pub trait DBConvertible: Sized {
    type DBType;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError>;

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError>;
}

#[derive(Debug, Error)]
pub enum DBFromConversionError {
    #[error("Failed to parse datetime: {0}")]
    DateTime(#[from] time::error::Parse),
    #[error("Failed to parse enum variant: {0}")]
    NoSuchVariant(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(i64),
}

#[derive(Debug, Error)]
pub enum DBToConversionError {
    #[error("Failed to format datetime")]
    DateTime(#[from] time::error::Format),
    #[error("Number does not fit into a database integer: {0}")]
    OutOfRange(u64),
}

fn u64_to_db(value: u64) -> Result<i64, DBToConversionError> {
    i64::try_from(value).map_err(|_| DBToConversionError::OutOfRange(value))
}

fn u64_from_db(value: i64) -> Result<u64, DBFromConversionError> {
    u64::try_from(value).map_err(|_| DBFromConversionError::InvalidNumber(value))
}

/// Discord snowflakes are never zero; serenity panics on a zero id.
fn snowflake_from_db(value: i64) -> Result<u64, DBFromConversionError> {
    match u64_from_db(value)? {
        0 => Err(DBFromConversionError::InvalidNumber(value)),
        id => Ok(id),
    }
}

impl DBConvertible for UtcDateTime {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        let string = OffsetDateTime::from(*self).format(&Iso8601::DEFAULT)?;
        Ok(string)
    }

    fn from_db(db_value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        let datetime = OffsetDateTime::parse(db_value, &Iso8601::DEFAULT)?;
        Ok(UtcDateTime::from(datetime))
    }
}

macro_rules! id_conversion {
    ($($id:ident),* $(,)?) => {
        $(
            impl DBConvertible for $id {
                type DBType = i64;

                fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
                    u64_to_db(self.0)
                }

                fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
                    Ok($id(u64_from_db(*value)?))
                }
            }
        )*
    };
}

id_conversion!(
    EventId,
    ParticipantId,
    PairId,
    MessageId,
    GiftConfirmationId,
    FeedbackId,
);

impl DBConvertible for UserId {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        u64_to_db(self.get())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(UserId::new(snowflake_from_db(*value)?))
    }
}

impl DBConvertible for GuildId {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        u64_to_db(self.get())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(GuildId::new(snowflake_from_db(*value)?))
    }
}

impl DBConvertible for ChannelId {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        u64_to_db(self.get())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(ChannelId::new(snowflake_from_db(*value)?))
    }
}

impl DBConvertible for EventStatus {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(match self {
            EventStatus::Registration => "Registration",
            EventStatus::InProgress => "InProgress",
            EventStatus::Completed => "Completed",
        }
        .to_string())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        match value.as_str() {
            "Registration" => Ok(EventStatus::Registration),
            "InProgress" => Ok(EventStatus::InProgress),
            "Completed" => Ok(EventStatus::Completed),

            unknown => Err(DBFromConversionError::NoSuchVariant(unknown.to_string())),
        }
    }
}

impl DBConvertible for ReminderKind {
    type DBType = String;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        use ReminderKind::*;

        Ok(match self {
            RegistrationClosesInDay => "RegistrationClosesInDay",
            RegistrationClosesInHour => "RegistrationClosesInHour",
            RegistrationClosed => "RegistrationClosed",
            ShippingDeadlineInThreeDays => "ShippingDeadlineInThreeDays",
            ShippingDeadlineInDay => "ShippingDeadlineInDay",
            EventCompleted => "EventCompleted",
        }
        .to_string())
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        use ReminderKind::*;

        match value.as_str() {
            "RegistrationClosesInDay" => Ok(RegistrationClosesInDay),
            "RegistrationClosesInHour" => Ok(RegistrationClosesInHour),
            "RegistrationClosed" => Ok(RegistrationClosed),
            "ShippingDeadlineInThreeDays" => Ok(ShippingDeadlineInThreeDays),
            "ShippingDeadlineInDay" => Ok(ShippingDeadlineInDay),
            "EventCompleted" => Ok(EventCompleted),

            unknown => Err(DBFromConversionError::NoSuchVariant(unknown.to_string())),
        }
    }
}

impl DBConvertible for Rating {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(self.get() as _)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Rating::new(*value).map_err(|_| DBFromConversionError::InvalidNumber(*value))
    }
}

impl DBConvertible for u32 {
    type DBType = i64;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(*self as _)
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        u32::try_from(*value).map_err(|_| DBFromConversionError::InvalidNumber(*value))
    }
}
