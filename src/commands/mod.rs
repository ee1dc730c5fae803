mod derive_slug;

mod arguments;
mod event;
mod feedback;
mod gifts;
mod help;
mod messaging;
mod registration;
mod santa;

use poise::serenity_prelude::UserId;

use crate::{
    models::{Event, Pair, Participant, ParticipantId},
    BotState,
};

pub use event::event;
pub use feedback::feedback;
pub use gifts::{gift_sent, gifts};
pub use help::help;
pub use messaging::{history, message};
pub use registration::{profile, profile_edit, register};
pub use santa::recipient;

type CommandResult = Result<(), CommandError>;
type Context<'a> = poise::Context<'a, BotState, CommandError>;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("{message}")]
    User { message: String },
    #[error("{message}")]
    Internal { message: String },
    #[error(transparent)]
    Serenity(#[from] serenity::Error),
}

fn user_err(message: impl Into<String>) -> CommandError {
    CommandError::User {
        message: message.into(),
    }
}

fn internal_err(message: impl Into<String>) -> CommandError {
    CommandError::Internal {
        message: message.into(),
    }
}

/// Resolves an event slug.
///
/// In a server the slug belongs to that server. In DMs it is looked up among
/// the events the author takes part in.
async fn find_event(ctx: Context<'_>, slug: &str) -> Result<Event, CommandError> {
    let repository = &ctx.data().event_repository;

    match ctx.guild_id() {
        Some(guild) => repository
            .get_event_by_slug(guild, slug)
            .await
            .map_err(|err| internal_err(format!("Could not get the event: {err}")))?
            .ok_or_else(|| user_err(format!("There is no event `{slug}` in this server."))),

        None => {
            let mut events = repository
                .get_user_events_by_slug(ctx.author().id, slug)
                .await
                .map_err(|err| internal_err(format!("Could not get the event: {err}")))?;

            match events.len() {
                0 => Err(user_err(format!("You don't take part in an event `{slug}`."))),
                1 => Ok(events.remove(0)),
                _ => Err(user_err(format!(
                    "You take part in several events called `{slug}`. Please use this command in the event's server."
                ))),
            }
        }
    }
}

async fn find_participant(
    ctx: Context<'_>,
    event: &Event,
    user: UserId,
) -> Result<Option<Participant>, CommandError> {
    ctx.data()
        .participant_repository
        .get_by_user(event.id, user)
        .await
        .map_err(|err| internal_err(format!("Could not get the participant: {err}")))
}

/// The author's registration, or a user error if there is none.
async fn require_participant(ctx: Context<'_>, event: &Event) -> Result<Participant, CommandError> {
    find_participant(ctx, event, ctx.author().id)
        .await?
        .ok_or_else(|| {
            user_err(format!(
                "You are not registered for **{}**. Use `/register {}` while registration is open.",
                event.title, event.slug
            ))
        })
}

async fn get_participant(
    ctx: Context<'_>,
    participant: ParticipantId,
) -> Result<Participant, CommandError> {
    ctx.data()
        .participant_repository
        .get_participant(participant)
        .await
        .map_err(|err| internal_err(format!("Could not get the participant: {err}")))?
        .ok_or_else(|| internal_err(format!("Participant {participant:?} does not exist")))
}

/// The pair in which `participant` is the santa.
async fn giver_pair(
    ctx: Context<'_>,
    event: &Event,
    participant: &Participant,
) -> Result<Pair, CommandError> {
    ctx.data()
        .pair_repository
        .get_pair_by_giver(event.id, participant.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the pair: {err}")))?
        .ok_or_else(|| not_drawn_yet(event))
}

/// The pair in which `participant` receives the gift.
async fn receiver_pair(
    ctx: Context<'_>,
    event: &Event,
    participant: &Participant,
) -> Result<Pair, CommandError> {
    ctx.data()
        .pair_repository
        .get_pair_by_receiver(event.id, participant.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the pair: {err}")))?
        .ok_or_else(|| not_drawn_yet(event))
}

fn not_drawn_yet(event: &Event) -> CommandError {
    user_err(format!(
        "The draw for **{}** hasn't happened yet. You will get a DM once it has.",
        event.title
    ))
}
