use poise::samples::HelpConfiguration;

use crate::commands::{CommandResult, Context};

/// Get help for available bot commands.
#[poise::command(slash_command, ephemeral)]
pub async fn help(
    ctx: Context<'_>,

    #[description = "The command to provide help about."]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    let config = HelpConfiguration {
        extra_text_at_bottom: "Every command takes the event slug, e.g. `/recipient OfficeSanta`.",
        ..Default::default()
    };

    poise::builtins::help(ctx, command.as_deref(), config).await?;

    Ok(())
}
