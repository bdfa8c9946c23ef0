//! Generic paginated view.
//!
//! One implementation backs every multi-page result: OCR text, plant
//! matches, manga pages, meme feeds and the help menu. Pages are rendered
//! lazily through [`Render`]; the paginator only tracks the cursor.

use super::{Interaction, Notice, Step};
use crate::error::CogbotError;
use crate::render::{ActionRow, Button, ButtonStyle, Render, RenderedMessage};
use crate::Result;

/// Cursor over an ordered, non-empty sequence of pages.
///
/// Invariant: `index < pages.len()` at all times.
#[derive(Debug, Clone)]
pub struct Paginator<P> {
    pages: Vec<P>,
    index: usize,
}

impl<P: Render> Paginator<P> {
    /// Create a paginator positioned on the first page.
    pub fn new(pages: Vec<P>) -> Result<Self> {
        if pages.is_empty() {
            return Err(CogbotError::InvalidInput(
                "a paginator needs at least one page".into(),
            ));
        }
        Ok(Self { pages, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Current 0-based index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &P {
        &self.pages[self.index]
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.pages.len()
    }

    pub fn next(&mut self) -> Step {
        if self.is_last() {
            return Notice::AlreadyLastPage.into();
        }
        self.index += 1;
        Step::Updated
    }

    pub fn previous(&mut self) -> Step {
        if self.index == 0 {
            return Notice::AlreadyFirstPage.into();
        }
        self.index -= 1;
        Step::Updated
    }

    pub fn first(&mut self) -> Step {
        if self.index == 0 {
            return Notice::AlreadyFirstPage.into();
        }
        self.index = 0;
        Step::Updated
    }

    pub fn last(&mut self) -> Step {
        if self.is_last() {
            return Notice::AlreadyLastPage.into();
        }
        self.index = self.pages.len() - 1;
        Step::Updated
    }

    /// Jump to a 1-based page number.
    pub fn jump(&mut self, page: i64) -> Step {
        let pages = self.pages.len();
        match usize::try_from(page) {
            Ok(n) if (1..=pages).contains(&n) => {
                self.index = n - 1;
                Step::Updated
            }
            _ => Notice::InvalidPage {
                requested: page.to_string(),
                pages,
            }
            .into(),
        }
    }

    /// Jump using the raw text of the jump modal.
    pub fn jump_text(&mut self, text: &str) -> Step {
        match text.trim().parse() {
            Ok(page) => self.jump(page),
            Err(_) => Notice::InvalidPage {
                requested: text.trim().to_string(),
                pages: self.pages.len(),
            }
            .into(),
        }
    }

    pub fn apply(&mut self, interaction: &Interaction) -> Step {
        match interaction {
            Interaction::First => self.first(),
            Interaction::Previous => self.previous(),
            Interaction::Next => self.next(),
            Interaction::Last => self.last(),
            Interaction::Jump { page } => self.jump(*page),
            Interaction::JumpText { text } => self.jump_text(text),
            other => Notice::UnsupportedAction(other.name()).into(),
        }
    }

    /// Render the current page with its position footer and navigation rows.
    pub fn render(&self) -> Result<RenderedMessage> {
        let mut message = self.current().render()?;
        let position = format!("Page {}/{}", self.index + 1, self.pages.len());

        match message.embed.as_mut() {
            Some(embed) => {
                embed.footer = Some(match embed.footer.take() {
                    Some(existing) => format!("{existing} • {position}"),
                    None => position,
                });
            }
            None => {
                message.content = Some(match message.content.take() {
                    Some(existing) => format!("{existing}\n{position}"),
                    None => position,
                });
            }
        }

        let at_start = self.index == 0;
        let at_end = self.is_last();
        message.components.push(ActionRow::new(vec![
            Button::new("first", "⏮", ButtonStyle::Secondary).disabled(at_start),
            Button::new("prev", "◀", ButtonStyle::Primary).disabled(at_start),
            Button::new("jump", "🔢", ButtonStyle::Secondary).disabled(self.pages.len() == 1),
            Button::new("next", "▶", ButtonStyle::Primary).disabled(at_end),
            Button::new("last", "⏭", ButtonStyle::Secondary).disabled(at_end),
        ]));
        message.components.push(ActionRow::new(vec![Button::new(
            "close",
            "Close",
            ButtonStyle::Danger,
        )]));
        Ok(message)
    }
}
