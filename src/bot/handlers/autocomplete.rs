//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::movement::KNOWN_CATEGORIES, errors::Error};

/// Discord's limit on autocomplete suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Categories whose name contains `partial`, case-insensitively, in their usual order.
#[must_use]
pub fn matching_categories(partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    KNOWN_CATEGORIES
        .iter()
        .filter(|category| category.contains(&partial_lower))
        .map(|category| (*category).to_string())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Provides autocomplete suggestions for movement categories.
///
/// The ledger accepts free-form categories; these are the ones the back office reports
/// on, so suggesting them keeps the reports tidy.
#[allow(clippy::unused_async)]
pub async fn autocomplete_category(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_categories(partial)
}
