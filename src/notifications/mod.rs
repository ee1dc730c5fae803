mod pair_notifier;
mod reminder_service;

use indoc::formatdoc;

use crate::{
    models::{Event, Participant},
    utils::formatting::format_deadline,
};

pub use pair_notifier::DiscordPairNotifier;
pub use reminder_service::{ReminderService, DEFAULT_INTERVAL};

/// Everything a santa needs to know about their receiver.
pub fn recipient_card(event: &Event, receiver: &Participant) -> String {
    let budget = match event.budget {
        Some(budget) => format!("\n**Budget:** {budget}"),
        None => String::new(),
    };

    formatdoc! {
        r#"
            ## Your recipient in {title}

            **Name:** {name} (@{username})
            **Wishes:** {wishes}
            **Address:** {address}
            **Delivery methods:** {delivery}{budget}

            Please send your gift before {deadline}.
            Use `/message {slug} recipient` to ask them something anonymously and `/gift_sent {slug}` once the gift is on its way.
        "#,
        title = event.title,
        name = receiver.display_name,
        username = receiver.username,
        wishes = or_unspecified(&receiver.wishes),
        address = or_unspecified(&receiver.address),
        delivery = or_unspecified(&receiver.delivery_methods),
        deadline = format_deadline(event.shipping_deadline),
        slug = event.slug,
    }
}

fn or_unspecified(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("not specified")
}
