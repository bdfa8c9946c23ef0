//! Rendered message payloads.
//!
//! A [`RenderedMessage`] is the platform-neutral shape of a Discord message
//! edit: optional content, at most one embed and rows of buttons. The relay
//! maps it 1:1 onto the chat platform's message payload.

use serde::{Deserialize, Serialize};

use crate::error::CogbotError;
use crate::session::SessionId;
use crate::Result;

/// Embed title limit imposed by the chat platform.
pub const MAX_TITLE_LEN: usize = 256;
/// Embed description limit imposed by the chat platform.
pub const MAX_DESCRIPTION_LEN: usize = 4096;
/// Maximum number of fields per embed.
pub const MAX_FIELDS: usize = 25;
/// Maximum number of buttons per action row.
pub const MAX_ROW_BUTTONS: usize = 5;
/// Maximum number of action rows per message.
pub const MAX_ROWS: usize = 5;

/// Anything that can be turned into a message.
pub trait Render {
    fn render(&self) -> Result<RenderedMessage>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub components: Vec<ActionRow>,
}

impl RenderedMessage {
    pub fn from_embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }

    /// Remove every interactive control, leaving the last visible content.
    pub fn strip_components(mut self) -> Self {
        self.components.clear();
        self
    }

    /// Grey out every control but keep it visible.
    pub fn disable_components(mut self) -> Self {
        for row in &mut self.components {
            for button in &mut row.buttons {
                button.disabled = true;
            }
        }
        self
    }

    /// Prefix every button's custom id with the owning session, so a press can
    /// be routed back to it.
    pub fn scoped_to(mut self, session: SessionId) -> Self {
        for row in &mut self.components {
            for button in &mut row.buttons {
                button.custom_id = format!("{}:{}", session, button.custom_id);
            }
        }
        self
    }

    /// Check the message against platform limits.
    pub fn validate(&self) -> Result<()> {
        if let Some(embed) = &self.embed {
            embed.validate()?;
        }
        if self.components.len() > MAX_ROWS {
            return Err(CogbotError::Render(format!(
                "{} action rows exceed the limit of {MAX_ROWS}",
                self.components.len()
            )));
        }
        if let Some(row) = self
            .components
            .iter()
            .find(|row| row.buttons.len() > MAX_ROW_BUTTONS)
        {
            return Err(CogbotError::Render(format!(
                "{} buttons in one row exceed the limit of {MAX_ROW_BUTTONS}",
                row.buttons.len()
            )));
        }
        Ok(())
    }
}

impl Render for RenderedMessage {
    fn render(&self) -> Result<RenderedMessage> {
        self.validate()?;
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RGB colour as `0xRRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(CogbotError::Render(format!(
                    "embed title exceeds {MAX_TITLE_LEN} characters"
                )));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(CogbotError::Render(format!(
                    "embed description exceeds {MAX_DESCRIPTION_LEN} characters"
                )));
            }
        }
        if self.fields.len() > MAX_FIELDS {
            return Err(CogbotError::Render(format!(
                "{} embed fields exceed the limit of {MAX_FIELDS}",
                self.fields.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

impl ActionRow {
    pub fn new(buttons: Vec<Button>) -> Self {
        Self { buttons }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A page supplied by a cog: one embed's worth of already-fetched content
/// (an OCR result, a plant match, a manga page, a meme).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default)]
    pub color: Option<u32>,
}

impl Page {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl Render for Page {
    fn render(&self) -> Result<RenderedMessage> {
        let embed = Embed {
            title: self.title.clone(),
            description: self.description.clone(),
            color: self.color,
            fields: self.fields.clone(),
            image_url: self.image_url.clone(),
            footer: None,
        };
        embed.validate()?;
        Ok(RenderedMessage::from_embed(embed))
    }
}
