use indoc::formatdoc;
use poise::CreateReply;
use tracing::warn;

use crate::{
    commands::{
        arguments::{EventSlug, TrimmedString},
        find_event, get_participant, giver_pair, internal_err, receiver_pair,
        require_participant, user_err, CommandResult, Context,
    },
    models::AnonymousMessage,
    utils::formatting::format_utc,
};

pub const HISTORY_LIMIT: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, poise::ChoiceParameter)]
pub enum MessageTarget {
    #[name = "santa"]
    Santa,
    #[name = "recipient"]
    Recipient,
}

/// Send an anonymous message to your santa or your recipient.
#[poise::command(slash_command, ephemeral)]
pub async fn message(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
    #[description = "Who gets the message"] to: MessageTarget,
    #[description = "The message"] text: TrimmedString,
) -> CommandResult {
    if text.is_empty() {
        return Err(user_err("The message can't be empty."));
    }

    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;

    let (pair, from_santa, counterpart_id) = match to {
        MessageTarget::Recipient => {
            let pair = giver_pair(ctx, &event, &participant).await?;
            (pair, true, pair.receiver_id)
        }
        MessageTarget::Santa => {
            let pair = receiver_pair(ctx, &event, &participant).await?;
            (pair, false, pair.giver_id)
        }
    };

    ctx.data()
        .message_repository
        .add_message(pair.id, from_santa, text.as_ref())
        .await
        .map_err(|err| internal_err(format!("Could not save the message: {err}")))?;

    let counterpart = get_participant(ctx, counterpart_id).await?;

    // Only the santa side is anonymous.
    let relayed = if from_santa {
        formatdoc! {
            r#"
                **Your Secret Santa in {title} writes** (reply with `/message {slug} santa`):
                >>> {text}
            "#,
            title = event.title,
            slug = event.slug,
            text = text,
        }
    } else {
        formatdoc! {
            r#"
                **Your recipient {name} in {title} writes** (reply with `/message {slug} recipient`):
                >>> {text}
            "#,
            name = participant.display_name,
            title = event.title,
            slug = event.slug,
            text = text,
        }
    };

    let reply = match ctx
        .data()
        .messenger
        .send_direct(counterpart.discord_user, relayed)
        .await
    {
        Ok(()) => "Message sent!".to_string(),
        Err(err) => {
            warn!("Could not relay a message on pair {:?}: {err}", pair.id);
            format!(
                "Your message is saved, but I couldn't DM it. They will see it in `/history {}`.",
                event.slug
            )
        }
    };

    ctx.send(CreateReply::default().content(reply).ephemeral(true))
        .await?;

    Ok(())
}

/// Show the anonymous messages with your santa and your recipient.
#[poise::command(slash_command, ephemeral)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;

    let as_santa = giver_pair(ctx, &event, &participant).await?;
    let as_recipient = receiver_pair(ctx, &event, &participant).await?;

    let mut lines = vec![];
    for (pair, i_am_santa) in [(as_santa, true), (as_recipient, false)] {
        let messages = ctx
            .data()
            .message_repository
            .get_messages_for_pair(pair.id, HISTORY_LIMIT)
            .await
            .map_err(|err| internal_err(format!("Could not get the messages: {err}")))?;

        lines.extend(
            messages
                .into_iter()
                .map(|message| (message.created_at, describe(&message, i_am_santa))),
        );
    }

    if lines.is_empty() {
        ctx.send(
            CreateReply::default()
                .content(format!("There are no messages in **{}** yet.", event.title))
                .ephemeral(true),
        )
        .await?;

        return Ok(());
    }

    lines.sort_by_key(|(created_at, _)| *created_at);
    let skip = lines.len().saturating_sub(HISTORY_LIMIT as usize);

    let history = lines
        .into_iter()
        .skip(skip)
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n");

    ctx.send(
        CreateReply::default()
            .content(format!("# Messages in {}\n{history}", event.title))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

fn describe(message: &AnonymousMessage, i_am_santa: bool) -> String {
    let direction = match (i_am_santa, message.from_santa) {
        (true, true) => "You → your recipient",
        (true, false) => "Your recipient → you",
        (false, true) => "Your santa → you",
        (false, false) => "You → your santa",
    };

    format!(
        "`{}` **{direction}:** {}",
        format_utc(message.created_at),
        message.text
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::models::{types::UtcDateTime, AnonymousMessage, MessageId, PairId};

    use super::describe;

    fn message(from_santa: bool) -> AnonymousMessage {
        AnonymousMessage {
            id: MessageId(1),
            pair_id: PairId(1),
            from_santa,
            text: "Do you like green?".to_string(),
            created_at: UtcDateTime::assume_utc(datetime!(2024-12-12 10:30)),
        }
    }

    #[test]
    fn directions_from_both_sides() {
        assert_eq!(
            describe(&message(true), true),
            "`2024-12-12 10:30` **You → your recipient:** Do you like green?"
        );
        assert!(describe(&message(true), false).contains("Your santa → you"));
        assert!(describe(&message(false), true).contains("Your recipient → you"));
        assert!(describe(&message(false), false).contains("You → your santa"));
    }
}
