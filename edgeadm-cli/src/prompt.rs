//! Terminal confirmation prompts.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm as DialoguerConfirm;
use edgeadm::{Confirm, FixedAnswer, InstallerError, InstallerResult};

/// Asks on the terminal, defaulting to "no".
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> InstallerResult<bool> {
        DialoguerConfirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| InstallerError::Prompt(e.to_string()))
    }
}

/// `--yes` answers every question; otherwise ask.
pub fn confirmer(assume_yes: bool) -> Box<dyn Confirm> {
    if assume_yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(TerminalConfirm)
    }
}
