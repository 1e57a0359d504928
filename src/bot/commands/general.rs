//! General Discord commands - ping, help, and other utility commands.
//! These commands don't touch the ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**CajaBuddy Help**\n\
        Amounts can be typed as on a receipt: `1.500`, `1.234,50`, `$ 250`.\n\n\
        **Shift Commands**\n\
        • `/shift status` - Shows the open shift and its expected totals.\n\
        • `/shift open <amount>` - Opens a shift with the opening cash.\n\
        • `/shift preview [cash] [transfer] [deposit]` - Previews the close without sending it.\n\
        • `/shift close <cash> <transfer> <deposit> [notes]` - \
        Closes the shift with the counted amounts.\n\
        • `/shift history [limit]` - Lists past shifts and their differences.\n\n\
        **Movement Commands**\n\
        • `/movement add <kind> <amount> <method> <description> [category] [date]` - \
        Records income or an expense.\n\
        • `/movement edit <id> ...` - Replaces a movement of the open shift.\n\
        • `/movement delete <id>` - Deletes a movement of the open shift.\n\
        • `/movement list [all]` - Lists movements (open shift only unless `all`).\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        A difference of zero or below is reported as Sobrante ✅, above zero as Faltante ⚠️.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
