use poise::CreateReply;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    commands::{
        arguments::EventSlug, find_event, internal_err, user_err, CommandError, CommandResult,
        Context,
    },
    models::types::UtcDateTime,
    pairing::PairingError,
    utils::formatting::format_deadline,
};

/// Hold the draw: pair every participant with a recipient and DM the santas.
#[poise::command(slash_command, rename = "pair")]
pub async fn pair(ctx: Context<'_>, #[description = "Event slug"] slug: EventSlug) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;

    let now = UtcDateTime::from(OffsetDateTime::now_utc());
    if now < event.registration_end {
        return Err(user_err(format!(
            "Registration for **{}** is open until {}. The draw can only be held after that.",
            event.title,
            format_deadline(event.registration_end),
        )));
    }

    ctx.defer().await?;

    let outcome = ctx
        .data()
        .pairing_service
        .run_pairing(event.id)
        .await
        .map_err(pairing_error)?;

    info!(
        "Draw for {} done by {}: {} pairs",
        event.slug,
        ctx.author().id,
        outcome.pairs.len()
    );

    ctx.send(CreateReply::default().content(outcome.message()))
        .await?;

    Ok(())
}

fn pairing_error(error: PairingError) -> CommandError {
    match error {
        PairingError::EventNotFound(_)
        | PairingError::InsufficientParticipants { .. }
        | PairingError::AlreadyPaired(_)
        | PairingError::PairingGenerationFailed { .. } => user_err(error.to_string()),

        PairingError::DuplicateParticipant(_) | PairingError::Persistence(_) => {
            internal_err(format!("Draw failed: {error}"))
        }
    }
}
