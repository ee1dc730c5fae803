use std::str::FromStr;

use indoc::formatdoc;
use poise::CreateReply;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::{
    commands::{
        arguments::{EventSlug, HumanDateTime, HumanDuration, TrimmedString},
        derive_slug::slug_from_title,
        internal_err, user_err, CommandResult, Context,
    },
    models::NewEvent,
    utils::formatting::{format_deadline, format_utc},
};

const DEFAULT_SHIPPING_PERIOD: Duration = Duration::days(14);

/// Create a Secret Santa event announced in this channel.
#[poise::command(slash_command, rename = "create")]
pub async fn create(
    ctx: Context<'_>,

    #[description = "The event title to use in announcements."] title: TrimmedString,

    #[description = "When registration closes, e.g. `2024-12-10 18:00 UTC+1`."]
    registration_end: HumanDateTime,

    #[description = "Time to send gifts after registration closes. Defaults to 14 days."]
    shipping_period: Option<HumanDuration>,

    #[description = "Suggested gift budget."]
    #[min = 1]
    budget: Option<u32>,

    #[description = "The name of the event to use in commands. Must consist only of `A-Za-z0-9_-`."]
    slug: Option<EventSlug>,
) -> CommandResult {
    if title.is_empty() {
        return Err(user_err("The event title can't be empty."));
    }

    let slug = match slug {
        Some(slug) => slug,
        None => EventSlug::from_str(&slug_from_title(title.as_ref())).map_err(|_| {
            user_err(format!(
                "Could not derive a slug from `{title}`, please provide one."
            ))
        })?,
    };

    let now = OffsetDateTime::now_utc();

    let registration_end = registration_end.materialize(now);
    if registration_end <= now {
        return Err(user_err(format!(
            "Registration end must be in the future, got {} UTC.",
            format_utc(registration_end)
        )));
    }

    let shipping_period = shipping_period
        .map(Duration::from)
        .unwrap_or(DEFAULT_SHIPPING_PERIOD);
    if shipping_period <= Duration::ZERO {
        return Err(user_err("The shipping period must be longer than zero."));
    }
    let shipping_deadline = registration_end + shipping_period;

    let guild = ctx.guild_id().ok_or(internal_err(
        "Event create command should only be invoked in guilds",
    ))?;

    let existing = ctx
        .data()
        .event_repository
        .get_event_by_slug(guild, slug.as_ref())
        .await
        .map_err(|err| internal_err(format!("Could not check for existing events: {err}")))?;

    if existing.is_some() {
        return Err(user_err(format!(
            "There is already an event `{slug}` in this server. Please pick another slug."
        )));
    }

    let event = ctx
        .data()
        .event_repository
        .create_event(NewEvent {
            guild,
            channel: ctx.channel_id(),
            organizer: ctx.author().id,
            slug: slug.to_string(),
            title: title.to_string(),
            budget,
            registration_end: registration_end.into(),
            shipping_deadline: shipping_deadline.into(),
        })
        .await
        .map_err(|err| internal_err(format!("Could not create the event: {err}")))?;

    info!("Created event {} ({:?}) in guild {guild}", event.slug, event.id);

    let budget = match event.budget {
        Some(budget) => format!("\n**Budget:** {budget}"),
        None => String::new(),
    };

    let message = formatdoc! {
        r#"
            # Secret Santa: {title}

            **Join with `/register {slug}`** before {end}.

            After registration closes everyone gets a recipient in the DMs. Gifts should be sent before {deadline}.{budget}
        "#,
        title = event.title,
        slug = event.slug,
        end = format_deadline(event.registration_end),
        deadline = format_deadline(event.shipping_deadline),
        budget = budget,
    };

    ctx.send(CreateReply::default().content(message)).await?;

    Ok(())
}
