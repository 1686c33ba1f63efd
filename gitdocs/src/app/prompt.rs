use std::error::Error as StdError;

use async_trait::async_trait;
use dialoguer::{Confirm as ConfirmPrompt, theme::ColorfulTheme};
use gitdocs_core::Confirm;

/// Asks on the terminal. dialoguer blocks, so the prompt runs on the blocking pool.
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, message: &str) -> Result<bool, Box<dyn StdError + Send + Sync>> {
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            ConfirmPrompt::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .default(false)
                .interact()
        }).await??; // join error, then prompt error
        Ok(answer)
    }
}
