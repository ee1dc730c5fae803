use poise::{Context, CreateReply, FrameworkError};
use tracing::{error, warn};

use crate::{commands::CommandError, BotState};

pub async fn handle_error(error: FrameworkError<'_, BotState, CommandError>) {
    use FrameworkError::*;

    match error {
        Setup { error, .. } => {
            error!("Error in bot setup: {}", error);
        }

        EventHandler { error, event, .. } => {
            error!(
                "Error while handling {}: {}",
                event.snake_case_name(),
                error
            );
        }

        Command { error, ctx, .. } => match error {
            CommandError::User { message } => {
                reply_with_error(ctx, &message).await;
            }

            CommandError::Internal { message } => {
                error!(
                    "Internal error in /{} invoked by {}: {}",
                    ctx.command().qualified_name,
                    ctx.author().id,
                    message
                );
                reply_with_internal_error(ctx).await;
            }

            CommandError::Serenity(error) => {
                error!(
                    "Discord error in /{} invoked by {}: {}",
                    ctx.command().qualified_name,
                    ctx.author().id,
                    error
                );
                reply_with_internal_error(ctx).await;
            }
        },

        ArgumentParse {
            error, input, ctx, ..
        } => {
            let response = match input {
                Some(input) => format!("**Sorry, cannot use `{input}` here.** {error}"),
                None => format!("**{error}**"),
            };

            reply_with_error(ctx, &response).await;
        }

        CommandStructureMismatch {
            description, ctx, ..
        } => {
            error!(
                "Failed to deserialize interaction arguments for `{}`: {}",
                ctx.command.qualified_name, description
            );
        }

        MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            warn!("Missing bot permissions: {missing_permissions}");
            reply_with_error(
                ctx,
                "Sorry, the bot lacks permissions necessary to execute this command.",
            )
            .await;
        }

        MissingUserPermissions { ctx, .. } => {
            reply_with_error(ctx, "Sorry, only server admins can manage Secret Santa events.")
                .await;
        }

        GuildOnly { ctx, .. } => {
            reply_with_error(ctx, "Sorry, but you can only run this command in a server.").await;
        }

        CommandCheckFailed { error, ctx, .. } => {
            let message = match error {
                Some(error) => format!("Sorry, you can't run this command: {error}"),
                None => "Sorry, you can't run this command.".to_string(),
            };

            reply_with_error(ctx, &message).await;
        }

        UnknownInteraction { interaction, .. } => {
            warn!("Received an unknown interaction: {:?}", interaction.data.name);
        }

        error => {
            error!("Unhandled framework error: {}", error);
        }
    }
}

async fn reply_with_error(ctx: Context<'_, BotState, CommandError>, error_message: &str) {
    if let Err(send_error) = poise::send_reply(
        ctx,
        CreateReply::default()
            .content(error_message)
            .ephemeral(true),
    )
    .await
    {
        error!(
            "Failed to send an error message to the user: {}\nThe message was: {}",
            send_error, error_message
        );
    }
}

async fn reply_with_internal_error(ctx: Context<'_, BotState, CommandError>) {
    reply_with_error(
        ctx,
        "Sorry, something went wrong on our side. Please try again later or contact the organizer.",
    )
    .await;
}
