mod event;
mod feedback;
mod gift;
mod message;
mod pair;
mod participant;
mod reminder;

pub mod types;

pub use event::{Event, EventId, EventStatus, NewEvent};
pub use feedback::{Feedback, FeedbackId, InvalidRating, Rating};
pub use gift::{GiftConfirmation, GiftConfirmationId, NewGiftConfirmation};
pub use message::{AnonymousMessage, MessageId};
pub use pair::{Pair, PairId};
pub use participant::{NewParticipant, Participant, ParticipantId, ProfileField};
pub use reminder::ReminderKind;
