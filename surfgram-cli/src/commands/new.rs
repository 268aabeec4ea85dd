use std::path::Path;

use anyhow::Context;

use super::Outcome;
use crate::console::Console;
use crate::prompt;
use crate::scaffold::{self, TemplateVars};

/// `surfgram new <bot_name>`: scaffold a project in `./<bot_name>`.
pub fn new(bot_name: &str, console: &Console) -> anyhow::Result<Outcome> {
    console.operation_header("🤖 Creating New Bot");
    let token = prompt::secret("🔑 Please enter your bot token").context("Failed to read bot token")?;

    let vars = TemplateVars {
        bot_name,
        token: &token,
    };
    let created = scaffold::create_bot(Path::new(bot_name), &vars, |target| {
        prompt::confirm(
            &format!("Directory '{}' exists. Overwrite?", target.display()),
            false,
        )
    })?;

    if created {
        Ok(Outcome::Success(format!(
            "✨ Bot '{}' created successfully!\n📁 Project structure initialized\n🚀 Ready to listen!",
            bot_name
        )))
    } else {
        Ok(Outcome::Cancelled("Bot creation cancelled".to_string()))
    }
}
