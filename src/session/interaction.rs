//! Component interactions delivered to a live session.

use serde::{Deserialize, Serialize};

use super::SessionId;

/// One button press, select or modal submission aimed at a session.
///
/// The relay translates Discord `custom_id`s (`sess-0000002a:next`,
/// `sess-0000002a:cell:4`) and modal payloads into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Interaction {
    First,
    Previous,
    Next,
    Last,
    /// 1-based page number typed into the jump modal.
    Jump { page: i64 },
    /// Jump-modal text that did not parse as a page number.
    JumpText { text: String },
    Close,
    /// 0-based grid cell.
    Cell { cell: usize },
    /// Free text from a modal or chat message.
    Submit { text: String },
}

impl Interaction {
    /// Short name used in logs and notices.
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::First => "first",
            Interaction::Previous => "previous",
            Interaction::Next => "next",
            Interaction::Last => "last",
            Interaction::Jump { .. } | Interaction::JumpText { .. } => "jump",
            Interaction::Close => "close",
            Interaction::Cell { .. } => "cell",
            Interaction::Submit { .. } => "submit",
        }
    }

    /// Parse the action suffix of a component `custom_id`.
    ///
    /// Returns `None` for unknown actions and for `jump`, which needs a
    /// modal value rather than a button press.
    pub fn from_custom_id(action: &str) -> Option<Self> {
        let mut parts = action.splitn(2, ':');
        match (parts.next()?, parts.next()) {
            ("first", None) => Some(Interaction::First),
            ("prev", None) => Some(Interaction::Previous),
            ("next", None) => Some(Interaction::Next),
            ("last", None) => Some(Interaction::Last),
            ("close", None) => Some(Interaction::Close),
            ("cell", Some(n)) => n.parse().ok().map(|cell| Interaction::Cell { cell }),
            _ => None,
        }
    }

    /// Parse a full component id as rendered by a session
    /// (`sess-0000002a:cell:4`) plus the modal value that came with it, if any.
    ///
    /// A jump value that is not a page number still reaches the session, so
    /// the user gets an invalid-page notice instead of a rejected request.
    pub fn parse_component(custom_id: &str, value: Option<&str>) -> Option<(SessionId, Self)> {
        let (session, action) = custom_id.split_once(':')?;
        let session = session.parse().ok()?;
        let interaction = match (action, value) {
            ("jump", Some(page)) => match page.trim().parse() {
                Ok(page) => Interaction::Jump { page },
                Err(_) => Interaction::JumpText {
                    text: page.trim().to_string(),
                },
            },
            ("submit", Some(text)) => Interaction::Submit {
                text: text.to_string(),
            },
            (action, _) => Self::from_custom_id(action)?,
        };
        Some((session, interaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let jump: Interaction = serde_json::from_str(r#"{"action":"jump","page":3}"#).unwrap();
        assert_eq!(jump, Interaction::Jump { page: 3 });

        let cell: Interaction = serde_json::from_str(r#"{"action":"cell","cell":4}"#).unwrap();
        assert_eq!(cell, Interaction::Cell { cell: 4 });

        let next: Interaction = serde_json::from_str(r#"{"action":"next"}"#).unwrap();
        assert_eq!(next, Interaction::Next);
    }

    #[test]
    fn test_from_custom_id() {
        assert_eq!(Interaction::from_custom_id("prev"), Some(Interaction::Previous));
        assert_eq!(
            Interaction::from_custom_id("cell:8"),
            Some(Interaction::Cell { cell: 8 })
        );
        assert_eq!(Interaction::from_custom_id("cell:x"), None);
        assert_eq!(Interaction::from_custom_id("jump"), None);
    }

    #[test]
    fn test_parse_component() {
        let id = SessionId::from_raw(42);
        assert_eq!(
            Interaction::parse_component("sess-0000002a:cell:4", None),
            Some((id, Interaction::Cell { cell: 4 }))
        );
        assert_eq!(
            Interaction::parse_component("sess-0000002a:jump", Some(" 3 ")),
            Some((id, Interaction::Jump { page: 3 }))
        );
        assert_eq!(Interaction::parse_component("sess-0000002a:jump", None), None);
        assert_eq!(
            Interaction::parse_component("sess-0000002a:jump", Some("two")),
            Some((
                id,
                Interaction::JumpText {
                    text: "two".to_string()
                }
            ))
        );
        assert_eq!(
            Interaction::parse_component("sess-0000002a:jump", Some("99999999999999999999")),
            Some((
                id,
                Interaction::JumpText {
                    text: "99999999999999999999".to_string()
                }
            ))
        );
        assert_eq!(Interaction::parse_component("sess-0000002a:bogus", None), None);
        assert_eq!(Interaction::parse_component("next", None), None);
    }
}
