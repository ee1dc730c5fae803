use indoc::formatdoc;
use poise::CreateReply;
use tracing::warn;

use crate::{
    commands::{
        arguments::{EventSlug, TrimmedString},
        find_event, get_participant, giver_pair, internal_err, receiver_pair,
        require_participant, CommandResult, Context,
    },
    models::NewGiftConfirmation,
    utils::formatting::format_utc,
};

/// Let your recipient know the gift is on its way.
#[poise::command(slash_command, ephemeral)]
pub async fn gift_sent(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
    #[description = "Parcel tracking number"] tracking: Option<TrimmedString>,
    #[description = "A note for your recipient"] message: Option<TrimmedString>,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;
    let pair = giver_pair(ctx, &event, &participant).await?;

    let confirmation = ctx
        .data()
        .gift_repository
        .add_confirmation(&NewGiftConfirmation {
            pair_id: pair.id,
            tracking_number: tracking.and_then(TrimmedString::into_optional),
            message: message.and_then(TrimmedString::into_optional),
        })
        .await
        .map_err(|err| internal_err(format!("Could not save the confirmation: {err}")))?;

    let receiver = get_participant(ctx, pair.receiver_id).await?;

    let mut notice = format!(
        "# Your Secret Santa gift in {} is on its way!",
        event.title
    );
    if let Some(tracking) = &confirmation.tracking_number {
        notice += &format!("\n**Tracking number:** `{tracking}`");
    }
    if let Some(note) = &confirmation.message {
        notice += &format!("\n**Your santa says:** {note}");
    }
    notice += &format!(
        "\nOnce it arrives, tell your santa what you think with `/feedback {}`.",
        event.slug
    );

    let reply = match ctx
        .data()
        .messenger
        .send_direct(receiver.discord_user, notice)
        .await
    {
        Ok(()) => format!("Noted! {} has been told the gift is coming.", receiver.display_name),
        Err(err) => {
            warn!("Could not DM gift confirmation on pair {:?}: {err}", pair.id);
            format!(
                "Noted! I couldn't DM {}, but they can check `/gifts {}`.",
                receiver.display_name, event.slug
            )
        }
    };

    ctx.send(CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}

/// Show the gifts you sent and whether yours is on its way.
#[poise::command(slash_command, ephemeral)]
pub async fn gifts(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;

    let as_santa = giver_pair(ctx, &event, &participant).await?;
    let as_recipient = receiver_pair(ctx, &event, &participant).await?;

    let sent = ctx
        .data()
        .gift_repository
        .get_confirmations(as_santa.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the confirmations: {err}")))?;

    let incoming = ctx
        .data()
        .gift_repository
        .has_confirmation(as_recipient.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the confirmations: {err}")))?;

    let sent = if sent.is_empty() {
        format!(
            "You haven't marked your gift as sent yet. Use `/gift_sent {}` once it's on its way.",
            event.slug
        )
    } else {
        sent.iter().fold(String::new(), |acc, confirmation| {
            acc + &format!(
                " - {} UTC{}\n",
                format_utc(confirmation.sent_at),
                confirmation
                    .tracking_number
                    .as_ref()
                    .map(|t| format!(", tracking `{t}`"))
                    .unwrap_or_default(),
            )
        })
    };

    let incoming = if incoming {
        "Your santa has sent your gift!"
    } else {
        "Your santa hasn't marked your gift as sent yet."
    };

    let message = formatdoc! {
        r#"
            # Gifts in {title}

            **Sent by you:**
            {sent}

            **For you:** {incoming}
        "#,
        title = event.title,
        sent = sent,
        incoming = incoming,
    };

    ctx.send(CreateReply::default().content(message).ephemeral(true))
        .await?;

    Ok(())
}
