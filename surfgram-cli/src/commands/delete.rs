use std::path::Path;

use super::Outcome;
use crate::console::Console;
use crate::prompt;
use crate::scaffold;

/// `surfgram delete <bot_name>`: remove `./<bot_name>` after confirmation.
pub fn delete(bot_name: &str, console: &Console) -> anyhow::Result<Outcome> {
    console.operation_header("🗑️ Delete Bot");

    let confirmed = prompt::confirm(
        &format!("⚠️  Are you sure you want to delete the bot '{}'?", bot_name),
        false,
    )?;
    if !confirmed {
        return Ok(Outcome::Cancelled("Deletion cancelled.".to_string()));
    }

    scaffold::delete_bot(Path::new(bot_name))?;
    Ok(Outcome::Success(format!("✅ Bot '{}' has been deleted", bot_name)))
}
