//! Transient notices and the outcome of applying input to a session.

use std::fmt;

use serde::Serialize;

use crate::render::RenderedMessage;

/// A message shown only to the user whose input produced it.
///
/// Notices never change session state. They cover boundary conditions,
/// validation failures and input from the wrong user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AlreadyFirstPage,
    AlreadyLastPage,
    /// `requested` is the user's input as typed.
    InvalidPage { requested: String, pages: usize },
    NotSessionOwner,
    NotYourTurn,
    CellOccupied(usize),
    InvalidCell(usize),
    /// Input arrived while a timed reveal or flip-back is pending.
    Busy,
    SessionOver,
    RuleFailed { rule: usize, message: String },
    UnsupportedAction(&'static str),
    RenderFailed,
    /// The user invoked a command too often; seconds until it is usable again.
    Cooldown(u64),
}

impl Notice {
    /// Stable machine-readable code for the relay.
    pub fn code(&self) -> &'static str {
        match self {
            Notice::AlreadyFirstPage => "already_first_page",
            Notice::AlreadyLastPage => "already_last_page",
            Notice::InvalidPage { .. } => "invalid_page",
            Notice::NotSessionOwner => "not_session_owner",
            Notice::NotYourTurn => "not_your_turn",
            Notice::CellOccupied(_) => "cell_occupied",
            Notice::InvalidCell(_) => "invalid_cell",
            Notice::Busy => "busy",
            Notice::SessionOver => "session_over",
            Notice::RuleFailed { .. } => "rule_failed",
            Notice::UnsupportedAction(_) => "unsupported_action",
            Notice::RenderFailed => "render_failed",
            Notice::Cooldown(_) => "cooldown",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AlreadyFirstPage => write!(f, "You are already on the first page."),
            Notice::AlreadyLastPage => write!(f, "You are already on the last page."),
            Notice::InvalidPage { requested, pages } => write!(
                f,
                "Page {requested} does not exist. Pick a number between 1 and {pages}."
            ),
            Notice::NotSessionOwner => write!(f, "This menu belongs to someone else."),
            Notice::NotYourTurn => write!(f, "It is not your turn."),
            Notice::CellOccupied(cell) => write!(f, "Cell {} is already taken.", cell + 1),
            Notice::InvalidCell(cell) => write!(f, "Cell {} cannot be played.", cell + 1),
            Notice::Busy => write!(f, "Hold on, the board is still updating."),
            Notice::SessionOver => write!(f, "This session has ended."),
            Notice::RuleFailed { rule, message } => write!(f, "Rule {rule}: {message}"),
            Notice::UnsupportedAction(action) => {
                write!(f, "`{action}` does nothing here.")
            }
            Notice::RenderFailed => write!(f, "Something went wrong while updating this message."),
            Notice::Cooldown(secs) => write!(f, "Slow down! Try again in {secs}s."),
        }
    }
}

/// Result of feeding one input event to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// State changed and the message must be re-rendered.
    Updated,
    /// State is unchanged; the notice goes to the requesting user only.
    Notice(Notice),
}

impl From<Notice> for Step {
    fn from(notice: Notice) -> Self {
        Step::Notice(notice)
    }
}

/// What the relay should do in response to one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Edit the session message in place.
    Update { message: RenderedMessage },
    /// Answer the requesting user only.
    Notice {
        ephemeral: bool,
        code: &'static str,
        notice: String,
    },
}

impl Reply {
    pub fn notice(notice: &Notice) -> Self {
        Reply::Notice {
            ephemeral: true,
            code: notice.code(),
            notice: notice.to_string(),
        }
    }

    pub fn message(&self) -> Option<&RenderedMessage> {
        match self {
            Reply::Update { message } => Some(message),
            Reply::Notice { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_page_message_is_one_based() {
        let notice = Notice::InvalidPage {
            requested: "7".to_string(),
            pages: 3,
        };
        let text = notice.to_string();
        assert!(text.contains('7'));
        assert!(text.contains("between 1 and 3"));
        assert_eq!(notice.code(), "invalid_page");
    }

    #[test]
    fn test_cell_numbers_are_one_based() {
        assert!(Notice::CellOccupied(0).to_string().contains("Cell 1"));
    }

    #[test]
    fn test_notice_into_step() {
        let step: Step = Notice::Busy.into();
        assert_eq!(step, Step::Notice(Notice::Busy));
    }

    #[test]
    fn test_notice_reply_json() {
        let json = serde_json::to_value(Reply::notice(&Notice::NotYourTurn)).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["ephemeral"], true);
        assert_eq!(json["code"], "not_your_turn");
    }
}
