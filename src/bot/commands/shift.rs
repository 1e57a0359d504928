//! Shift Discord commands - `/shift status|open|preview|close|history`.
//!
//! These commands translate operator input into session calls and render the
//! `core::report` text. Input errors surface through the framework error hook as "❌"
//! replies before anything is sent to the ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{
            reconcile::{CountedAmounts, Reconciliation, Standing},
            report,
        },
        entities::PaymentMethod,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    const DEFAULT_HISTORY_LIMIT: usize = 10;
    const MAX_HISTORY_LIMIT: usize = 30;

    const fn standing_color(standing: Standing) -> u32 {
        match standing {
            Standing::Surplus => 0x002E_CC71,   // Green
            Standing::Shortfall => 0x00E6_7E22, // Orange
        }
    }

    /// Parent command for the register's shift lifecycle.
    #[poise::command(
        slash_command,
        subcommands("shift_status", "shift_open", "shift_preview", "shift_close", "shift_history")
    )]
    pub async fn shift(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Shift command. Available subcommands:\n\
            `/shift status` - Show the open shift\n\
            `/shift open` - Open a new shift\n\
            `/shift preview` - Preview the close\n\
            `/shift close` - Close the open shift\n\
            `/shift history` - List past shifts";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the open shift and its expected totals.
    #[poise::command(slash_command, rename = "status")]
    pub async fn shift_status(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let current = ctx.data().session.refresh().await?;
        ctx.say(report::shift_status(current.as_ref())).await?;
        Ok(())
    }

    /// Opens a new shift with the cash in the drawer.
    #[poise::command(slash_command, rename = "open")]
    pub async fn shift_open(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Opening cash in the drawer (e.g. 5.000 or 1.234,50)"] amount: String,
    ) -> Result<()> {
        let shift = ctx.data().session.open_with_input(&amount).await?;
        info!(
            shift_id = shift.id,
            operator = %ctx.author().name,
            "Shift opened from Discord"
        );

        ctx.say(format!("✅ Shift opened.\n{}", report::shift_status(Some(&shift))))
            .await?;
        Ok(())
    }

    /// Previews the close without sending anything. Omitted amounts default to the
    /// expected figures.
    #[poise::command(slash_command, rename = "preview")]
    pub async fn shift_preview(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Counted cash"] cash: Option<String>,
        #[description = "Counted transfers"] transfer: Option<String>,
        #[description = "Counted deposits (señas)"] deposit: Option<String>,
    ) -> Result<()> {
        let context = ctx.data().session.close_context().await?;

        let mut counted = context.prefilled;
        for (method, input) in [
            (PaymentMethod::Cash, cash),
            (PaymentMethod::Transfer, transfer),
            (PaymentMethod::Deposit, deposit),
        ] {
            if let Some(input) = input {
                counted = counted.with_input(method, Some(&input))?;
            }
        }

        let preview = Reconciliation::preview(context.expected, &counted, context.expenses)?;
        let embed = serenity::CreateEmbed::default()
            .title(format!("Close preview - shift #{}", context.shift.id))
            .description(report::close_summary(&preview))
            .color(standing_color(preview.total_standing))
            .footer(serenity::CreateEmbedFooter::new(
                "Preview only. The ledger's figures are final once the shift is closed.",
            ));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Closes the open shift with the amounts counted per method.
    #[poise::command(slash_command, rename = "close")]
    pub async fn shift_close(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Counted cash"] cash: String,
        #[description = "Counted transfers"] transfer: String,
        #[description = "Counted deposits (señas)"] deposit: String,
        #[description = "Notes for the back office"] notes: Option<String>,
    ) -> Result<()> {
        // Reject bad input before deferring.
        CountedAmounts::from_inputs(Some(&cash), Some(&transfer), Some(&deposit))?;
        ctx.defer().await?;

        let outcome = ctx
            .data()
            .session
            .close_with_inputs(Some(&cash), Some(&transfer), Some(&deposit), notes.as_deref())
            .await?;
        info!(
            shift_id = outcome.shift.id,
            operator = %ctx.author().name,
            "Shift closed from Discord"
        );

        // Without a full ledger report the shift is still closed; fall back to the preview.
        let (shown, footer) = match &outcome.report {
            Some(report) if outcome.diverged => (
                report,
                Some("The ledger's figures differ from the preview; the ledger's are shown."),
            ),
            Some(report) => (report, None),
            None => (
                &outcome.preview,
                Some(
                    "The ledger closed the shift but sent an incomplete report; \
                     the preview is shown. Check the back office for the final figures.",
                ),
            ),
        };
        let mut embed = serenity::CreateEmbed::default()
            .title(format!("Shift #{} closed", outcome.shift.id))
            .description(report::close_summary(shown))
            .color(standing_color(shown.total_standing));
        if let Some(footer) = footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists past shifts and their total differences.
    #[poise::command(slash_command, rename = "history")]
    pub async fn shift_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How many shifts to show (default 10, max 30)"] limit: Option<u8>,
    ) -> Result<()> {
        let limit = limit
            .map_or(DEFAULT_HISTORY_LIMIT, usize::from)
            .clamp(1, MAX_HISTORY_LIMIT);
        let shifts = ctx.data().session.history().await?;

        if shifts.is_empty() {
            ctx.say("No shifts have been recorded yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = shifts.iter().take(limit).map(report::history_line).collect();
        let embed = serenity::CreateEmbed::default()
            .title("**Shift History**")
            .description(lines.join("\n"))
            .color(0x0034_98DB) // Blue color
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Showing {} of {} shifts",
                lines.len(),
                shifts.len()
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
