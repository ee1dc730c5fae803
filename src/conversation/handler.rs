use indoc::formatdoc;
use poise::serenity_prelude::{Context, FullEvent, Message};
use tracing::{debug, info};

use crate::{commands::CommandError, BotState};

use super::RegistrationEffect;

pub fn wishes_question(event_title: &str) -> String {
    formatdoc! {
        r#"
            # Registration for {event_title}

            What would you like to get? Your santa will see this. Type `-` to leave it to them.

            Type `cancel` at any point to stop.
        "#,
        event_title = event_title,
    }
}

const ADDRESS_QUESTION: &str =
    "Where should the gift go? Write your full postal address, or `-` to add it later with `/profile_edit`.";

const DELIVERY_QUESTION: &str =
    "How can you receive gifts? E.g. post, courier, pickup point. Type `-` to skip.";

/// Routes DM replies into open registration conversations.
pub async fn handle_event(
    ctx: &Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, BotState, CommandError>,
    data: &BotState,
) -> Result<(), CommandError> {
    if let FullEvent::Message { new_message } = event {
        if new_message.author.bot || new_message.guild_id.is_some() {
            return Ok(());
        }

        handle_direct_message(ctx, new_message, data).await?;
    }

    Ok(())
}

async fn handle_direct_message(
    ctx: &Context,
    message: &Message,
    data: &BotState,
) -> Result<(), CommandError> {
    let Some(step) =
        data.conversations
            .advance(message.author.id, message.channel_id, &message.content)
    else {
        return Ok(());
    };

    let reply = match step {
        Err(err) => err.to_string(),

        Ok(RegistrationEffect::AskAddress) => ADDRESS_QUESTION.to_string(),

        Ok(RegistrationEffect::AskDelivery) => DELIVERY_QUESTION.to_string(),

        Ok(RegistrationEffect::Cancelled) => {
            debug!("{} cancelled their registration", message.author.id);
            "Registration cancelled. You can start again with `/register`.".to_string()
        }

        Ok(RegistrationEffect::Register(participant)) => {
            let event = data
                .event_repository
                .get_event(participant.event_id)
                .await
                .map_err(|err| CommandError::Internal {
                    message: format!("Could not get the event: {err}"),
                })?;

            let registered = data
                .participant_repository
                .register(&participant)
                .await
                .map_err(|err| CommandError::Internal {
                    message: format!("Could not register the participant: {err}"),
                })?;

            match (event, registered) {
                (Some(event), Some(participant)) => {
                    info!(
                        "{} registered for {} as {:?}",
                        participant.discord_user, event.slug, participant.id
                    );

                    formatdoc! {
                        r#"
                            **You're in!** Welcome to {title}.

                            Check your details with `/profile {slug}`. You will get your recipient in the DMs after registration closes.
                        "#,
                        title = event.title,
                        slug = event.slug,
                    }
                }
                (Some(event), None) => format!(
                    "Could not register you for **{}**: you are already registered or registration has closed.",
                    event.title
                ),
                (None, _) => "This event no longer exists.".to_string(),
            }
        }
    };

    message.channel_id.say(ctx, reply).await?;

    Ok(())
}
