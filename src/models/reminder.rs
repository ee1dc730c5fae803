use strum::EnumIter;

/// Notifications the reminder service sends at most once per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum ReminderKind {
    RegistrationClosesInDay,
    RegistrationClosesInHour,
    RegistrationClosed,
    ShippingDeadlineInThreeDays,
    ShippingDeadlineInDay,
    EventCompleted,
}
