use super::{Conversation, ConversationStep};
use crate::render::{Embed, RenderedMessage, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

/// Footer text limit imposed by the chat platform.
const MAX_FOOTER_LEN: usize = 2048;
const DEFAULT_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WizardStep {
    Title,
    Description,
    Color,
    Footer,
}

/// Builds a custom embed from four answers: title, description, colour and
/// footer. `skip` leaves the optional steps empty and `cancel` aborts.
#[derive(Debug, Clone)]
pub struct EmbedWizard {
    step: WizardStep,
    embed: Embed,
}

impl EmbedWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Title,
            embed: Embed::default(),
        }
    }

    fn accept(&mut self, input: &str) -> Result<(), String> {
        let skip = input.eq_ignore_ascii_case("skip");
        match self.step {
            WizardStep::Title => {
                check_len(input, MAX_TITLE_LEN, "Title")?;
                self.embed.title = Some(input.to_string());
                self.step = WizardStep::Description;
            }
            WizardStep::Description => {
                check_len(input, MAX_DESCRIPTION_LEN, "Description")?;
                self.embed.description = Some(input.to_string());
                self.step = WizardStep::Color;
            }
            WizardStep::Color => {
                let color = if skip { DEFAULT_COLOR } else { parse_color(input)? };
                self.embed.color = Some(color);
                self.step = WizardStep::Footer;
            }
            WizardStep::Footer => {
                if !skip {
                    check_len(input, MAX_FOOTER_LEN, "Footer")?;
                    self.embed.footer = Some(input.to_string());
                }
            }
        }
        Ok(())
    }
}

impl Default for EmbedWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation for EmbedWizard {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn prompt(&self) -> String {
        match self.step {
            WizardStep::Title => "What should the title be? (type `cancel` to stop)".into(),
            WizardStep::Description => "Now send the description.".into(),
            WizardStep::Color => "Pick a colour as a hex code like `#ff8800`, or `skip`.".into(),
            WizardStep::Footer => "Finally, the footer text, or `skip`.".into(),
        }
    }

    fn advance(&mut self, input: &str) -> ConversationStep {
        let input = input.trim();
        if input.eq_ignore_ascii_case("cancel") {
            return ConversationStep::Cancelled;
        }
        if input.is_empty() {
            return ConversationStep::Retry("Send some text, please.".into());
        }

        let last = self.step == WizardStep::Footer;
        if let Err(message) = self.accept(input) {
            return ConversationStep::Retry(message);
        }
        if last {
            ConversationStep::Complete(RenderedMessage::from_embed(self.embed.clone()))
        } else {
            ConversationStep::Continue(self.prompt())
        }
    }
}

fn check_len(input: &str, max: usize, what: &str) -> Result<(), String> {
    let len = input.chars().count();
    if len > max {
        Err(format!("{what} is {len} characters; the limit is {max}."))
    } else {
        Ok(())
    }
}

fn parse_color(input: &str) -> Result<u32, String> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("`{input}` is not a six digit hex colour."));
    }
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(wizard: &mut EmbedWizard, inputs: &[&str]) -> ConversationStep {
        let mut last = ConversationStep::Cancelled;
        for input in inputs {
            last = wizard.advance(input);
        }
        last
    }

    #[test]
    fn test_builds_embed() {
        let mut wizard = EmbedWizard::new();
        let step = run(&mut wizard, &["Rules", "Be nice.", "#FF8800", "Mods"]);
        let ConversationStep::Complete(message) = step else {
            panic!("expected completion, got {step:?}");
        };
        let embed = message.embed.unwrap();
        assert_eq!(embed.title.as_deref(), Some("Rules"));
        assert_eq!(embed.description.as_deref(), Some("Be nice."));
        assert_eq!(embed.color, Some(0xFF8800));
        assert_eq!(embed.footer.as_deref(), Some("Mods"));
    }

    #[test]
    fn test_skip_optional_steps() {
        let mut wizard = EmbedWizard::new();
        let step = run(&mut wizard, &["T", "D", "skip", "SKIP"]);
        let ConversationStep::Complete(message) = step else {
            panic!("expected completion");
        };
        let embed = message.embed.unwrap();
        assert_eq!(embed.color, Some(DEFAULT_COLOR));
        assert!(embed.footer.is_none());
    }

    #[test]
    fn test_bad_colour_keeps_step() {
        let mut wizard = EmbedWizard::new();
        run(&mut wizard, &["T", "D"]);
        assert!(matches!(wizard.advance("orange"), ConversationStep::Retry(_)));
        assert!(matches!(wizard.advance("#12345"), ConversationStep::Retry(_)));
        assert!(matches!(wizard.advance("00ff00"), ConversationStep::Continue(_)));
    }

    #[test]
    fn test_title_limit() {
        let mut wizard = EmbedWizard::new();
        let long = "a".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(wizard.advance(&long), ConversationStep::Retry(_)));
        assert!(wizard.prompt().contains("title"));
    }

    #[test]
    fn test_cancel_any_step() {
        let mut wizard = EmbedWizard::new();
        wizard.advance("T");
        assert_eq!(wizard.advance("Cancel"), ConversationStep::Cancelled);
    }
}
