//! Movement Discord commands - `/movement add|edit|delete|list`.
//!
//! Movements are recorded against the open shift. Only movements of the open shift
//! that the ledger still marks as editable can be changed or deleted.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{aggregate, movement::MovementDraft, report},
        entities::{MovementKind, PaymentMethod},
        errors::{Error, Result},
    };
    use chrono::{Local, NaiveDate};
    use poise::serenity_prelude as serenity;

    const LIST_LIMIT: usize = 20;

    /// Direction of a movement as offered in Discord.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum KindChoice {
        #[name = "Ingreso"]
        Income,
        #[name = "Egreso"]
        Expense,
    }

    impl From<KindChoice> for MovementKind {
        fn from(choice: KindChoice) -> Self {
            match choice {
                KindChoice::Income => Self::Income,
                KindChoice::Expense => Self::Expense,
            }
        }
    }

    /// Payment method as offered in Discord.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum MethodChoice {
        #[name = "Efectivo"]
        Cash,
        #[name = "Transferencia"]
        Transfer,
        #[name = "Tarjeta"]
        Card,
        #[name = "Seña"]
        Deposit,
    }

    impl From<MethodChoice> for PaymentMethod {
        fn from(choice: MethodChoice) -> Self {
            match choice {
                MethodChoice::Cash => Self::Cash,
                MethodChoice::Transfer => Self::Transfer,
                MethodChoice::Card => Self::Card,
                MethodChoice::Deposit => Self::Deposit,
            }
        }
    }

    /// Accepts `DD/MM/YYYY` or `YYYY-MM-DD`.
    fn parse_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        NaiveDate::parse_from_str(raw, "%d/%m/%Y")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .map(Some)
            .map_err(|_| Error::InvalidMovement {
                reason: format!("invalid date '{raw}', use DD/MM/YYYY"),
            })
    }

    fn draft(
        kind: KindChoice,
        amount: String,
        method: MethodChoice,
        description: String,
        category: Option<String>,
        date: Option<&str>,
    ) -> Result<MovementDraft> {
        Ok(MovementDraft {
            kind: kind.into(),
            amount,
            description,
            method: method.into(),
            category,
            date: parse_date(date)?,
        })
    }

    /// Parent command for cash movements of the open shift.
    #[poise::command(
        slash_command,
        subcommands("movement_add", "movement_edit", "movement_delete", "movement_list")
    )]
    pub async fn movement(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Movement command. Available subcommands:\n\
            `/movement add` - Record income or an expense\n\
            `/movement edit` - Replace a movement of the open shift\n\
            `/movement delete` - Delete a movement of the open shift\n\
            `/movement list` - List movements";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records income or an expense against the open shift.
    #[poise::command(slash_command, rename = "add")]
    pub async fn movement_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Income or expense"] kind: KindChoice,
        #[description = "Amount (e.g. 1.500 or 1.234,50)"] amount: String,
        #[description = "Payment method (card is income only)"] method: MethodChoice,
        #[description = "What it was for"] description: String,
        #[description = "Category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Date (DD/MM/YYYY), defaults to today"] date: Option<String>,
    ) -> Result<()> {
        let draft = draft(kind, amount, method, description, category, date.as_deref())?;
        let today = Local::now().date_naive();

        let created = ctx.data().session.record_movement(&draft, today).await?;
        ctx.say(format!(
            "✅ Recorded {} (Movement ID: {})",
            report::movement_line(&created, false),
            created.id
        ))
        .await?;
        Ok(())
    }

    /// Replaces a movement of the open shift.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn movement_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Movement ID"] id: i64,
        #[description = "Income or expense"] kind: KindChoice,
        #[description = "Amount (e.g. 1.500 or 1.234,50)"] amount: String,
        #[description = "Payment method (card is income only)"] method: MethodChoice,
        #[description = "What it was for"] description: String,
        #[description = "Category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Date (DD/MM/YYYY), defaults to today"] date: Option<String>,
    ) -> Result<()> {
        let draft = draft(kind, amount, method, description, category, date.as_deref())?;
        let today = Local::now().date_naive();

        let updated = ctx.data().session.update_movement(id, &draft, today).await?;
        ctx.say(format!("✅ Updated {}", report::movement_line(&updated, true)))
            .await?;
        Ok(())
    }

    /// Deletes a movement of the open shift.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn movement_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Movement ID"] id: i64,
    ) -> Result<()> {
        let deleted = ctx.data().session.delete_movement(id).await?;
        ctx.say(format!("🗑️ Deleted {}", report::movement_line(&deleted, false)))
            .await?;
        Ok(())
    }

    /// Lists movements, newest first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn movement_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Include movements of closed shifts"] all: Option<bool>,
    ) -> Result<()> {
        let session = &ctx.data().session;
        let current = session.refresh().await?;
        let movements = session.movements().await?;

        let (title, movements) = match (&current, all.unwrap_or(false)) {
            (Some(shift), false) => (
                format!("**Movements - shift #{}**", shift.id),
                aggregate::movements_for_shift(&movements, shift.id),
            ),
            _ => ("**All Movements**".to_string(), movements),
        };

        if movements.is_empty() {
            ctx.say("No movements recorded yet.").await?;
            return Ok(());
        }

        let totals = aggregate::ledger_totals(&movements)?;
        let lines: Vec<String> = movements
            .iter()
            .take(LIST_LIMIT)
            .map(|m| report::movement_line(m, m.is_editable_under(current.as_ref())))
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title(title)
            .description(lines.join("\n"))
            .color(0x0058_65F2) // Discord purple
            .footer(serenity::CreateEmbedFooter::new(report::totals_line(&totals)));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
