mod announce;
mod create;
mod delete;
mod list;
mod pair;
mod participants;

use super::{user_err, CommandResult, Context};

/// Manage the server's Secret Santa events.
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "create::create",
        "list::list",
        "participants::participants",
        "pair::pair",
        "announce::announce",
        "delete::delete"
    ),
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn event(_ctx: Context<'_>) -> CommandResult {
    Err(user_err("Please use one of the `/event` subcommands"))
}
