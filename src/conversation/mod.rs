//! The DM registration wizard.
//!
//! `/register` opens a conversation in the member's DMs. Each reply moves the
//! conversation one step forward through [`transition`]; the conversation is
//! keyed by the member and the DM channel, so several members can register at
//! the same time.

mod handler;

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use poise::serenity_prelude::{ChannelId, UserId};
use thiserror::Error;

use crate::models::NewParticipant;

pub use handler::{handle_event, wishes_question};

const CANCEL: &str = "cancel";
const SKIP: &str = "-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    AwaitingWishes(NewParticipant),
    AwaitingAddress(NewParticipant),
    AwaitingDelivery(NewParticipant),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationEffect {
    AskAddress,
    AskDelivery,
    Register(NewParticipant),
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Please type an answer, or `-` to leave it empty.")]
    EmptyInput,
}

/// Advances the wizard by one reply. `None` as the next state means the
/// conversation is over.
pub fn transition(
    state: &RegistrationState,
    input: &str,
) -> Result<(Option<RegistrationState>, RegistrationEffect), TransitionError> {
    let input = input.trim();

    if input.eq_ignore_ascii_case(CANCEL) {
        return Ok((None, RegistrationEffect::Cancelled));
    }

    if input.is_empty() {
        return Err(TransitionError::EmptyInput);
    }

    let answer = (input != SKIP).then(|| input.to_string());

    Ok(match state {
        RegistrationState::AwaitingWishes(draft) => (
            Some(RegistrationState::AwaitingAddress(NewParticipant {
                wishes: answer,
                ..draft.clone()
            })),
            RegistrationEffect::AskAddress,
        ),
        RegistrationState::AwaitingAddress(draft) => (
            Some(RegistrationState::AwaitingDelivery(NewParticipant {
                address: answer,
                ..draft.clone()
            })),
            RegistrationEffect::AskDelivery,
        ),
        RegistrationState::AwaitingDelivery(draft) => (
            None,
            RegistrationEffect::Register(NewParticipant {
                delivery_methods: answer,
                ..draft.clone()
            }),
        ),
    })
}

/// Open registration conversations.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<(UserId, ChannelId), RegistrationState>>,
}

impl ConversationStore {
    /// Starts a conversation, replacing any unfinished one in the same channel.
    pub fn begin(&self, user: UserId, channel: ChannelId, state: RegistrationState) {
        self.lock().insert((user, channel), state);
    }

    /// Feeds a reply into the conversation. Returns `None` if there is no open
    /// conversation, which means the message is not meant for the wizard.
    pub fn advance(
        &self,
        user: UserId,
        channel: ChannelId,
        input: &str,
    ) -> Option<Result<RegistrationEffect, TransitionError>> {
        let mut conversations = self.lock();
        let state = conversations.get(&(user, channel))?;

        Some(match transition(state, input) {
            Ok((Some(next), effect)) => {
                conversations.insert((user, channel), next);
                Ok(effect)
            }
            Ok((None, effect)) => {
                conversations.remove(&(user, channel));
                Ok(effect)
            }
            Err(err) => Err(err),
        })
    }

    pub fn is_active(&self, user: UserId, channel: ChannelId) -> bool {
        self.lock().contains_key(&(user, channel))
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(UserId, ChannelId), RegistrationState>> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::{ChannelId, UserId};

    use crate::{models::EventId, repository::test_util::new_participant};

    use super::{
        transition, ConversationStore, RegistrationEffect, RegistrationState, TransitionError,
    };

    fn draft() -> crate::models::NewParticipant {
        let mut draft = new_participant(EventId(1), 10);
        draft.wishes = None;
        draft.address = None;
        draft.delivery_methods = None;
        draft
    }

    #[test]
    fn walks_through_all_questions() {
        let (state, effect) =
            transition(&RegistrationState::AwaitingWishes(draft()), "Books, tea").unwrap();
        assert_eq!(effect, RegistrationEffect::AskAddress);

        let (state, effect) = transition(&state.unwrap(), "  1 Elm Street  ").unwrap();
        assert_eq!(effect, RegistrationEffect::AskDelivery);

        let (state, effect) = transition(&state.unwrap(), "Post").unwrap();
        assert_eq!(state, None);

        let RegistrationEffect::Register(participant) = effect else {
            panic!("Expected a registration, got {effect:?}");
        };
        assert_eq!(participant.wishes.as_deref(), Some("Books, tea"));
        assert_eq!(participant.address.as_deref(), Some("1 Elm Street"));
        assert_eq!(participant.delivery_methods.as_deref(), Some("Post"));
    }

    #[test]
    fn dash_skips_a_question() {
        let (state, _) = transition(&RegistrationState::AwaitingWishes(draft()), "-").unwrap();

        let Some(RegistrationState::AwaitingAddress(participant)) = state else {
            panic!("Expected the address question, got {state:?}");
        };
        assert_eq!(participant.wishes, None);
    }

    #[test]
    fn cancel_at_any_step() {
        for state in [
            RegistrationState::AwaitingWishes(draft()),
            RegistrationState::AwaitingAddress(draft()),
            RegistrationState::AwaitingDelivery(draft()),
        ] {
            assert_eq!(
                transition(&state, " Cancel "),
                Ok((None, RegistrationEffect::Cancelled))
            );
        }
    }

    #[test]
    fn empty_reply_is_rejected() {
        assert_eq!(
            transition(&RegistrationState::AwaitingAddress(draft()), "   "),
            Err(TransitionError::EmptyInput)
        );
    }

    #[test]
    fn store_tracks_each_conversation_separately() {
        let store = ConversationStore::default();
        let (alice, bob) = (UserId::new(1), UserId::new(2));
        let (alice_dm, bob_dm) = (ChannelId::new(11), ChannelId::new(12));

        store.begin(alice, alice_dm, RegistrationState::AwaitingWishes(draft()));
        store.begin(bob, bob_dm, RegistrationState::AwaitingDelivery(draft()));

        assert_eq!(
            store.advance(alice, alice_dm, "Socks"),
            Some(Ok(RegistrationEffect::AskAddress))
        );
        assert!(matches!(
            store.advance(bob, bob_dm, "Courier"),
            Some(Ok(RegistrationEffect::Register(_)))
        ));

        assert!(store.is_active(alice, alice_dm));
        assert!(!store.is_active(bob, bob_dm));
        assert_eq!(store.advance(bob, bob_dm, "hello?"), None);
        assert_eq!(store.advance(alice, bob_dm, "wrong channel"), None);
    }

    #[test]
    fn failed_step_keeps_the_conversation() {
        let store = ConversationStore::default();
        let (user, channel) = (UserId::new(1), ChannelId::new(11));
        store.begin(user, channel, RegistrationState::AwaitingWishes(draft()));

        assert_eq!(
            store.advance(user, channel, ""),
            Some(Err(TransitionError::EmptyInput))
        );
        assert_eq!(
            store.advance(user, channel, "Chocolate"),
            Some(Ok(RegistrationEffect::AskAddress))
        );
    }
}
