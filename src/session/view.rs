//! The interactive content a session drives.

use std::time::Duration;

use serde::Serialize;

use super::{Interaction, Notice, Paginator, SessionTimings, Step, UserId};
use crate::cogs::HelpPage;
use crate::games::{MemoryGame, MemoryPhase, PasswordGame, PasswordState, TicTacToe};
use crate::render::{Page, RenderedMessage};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Pages,
    Help,
    TicTacToe,
    Memory,
    Password,
}

/// A delayed transition the session must run on its own, without input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Memory grid: mask the board after the initial reveal.
    EndReveal,
    /// Memory grid: flip a mismatched pair back over.
    HideMismatch,
}

impl Followup {
    pub fn delay(&self, timings: &SessionTimings) -> Duration {
        match self {
            Followup::EndReveal => timings.memory_reveal,
            Followup::HideMismatch => timings.memory_mismatch,
        }
    }
}

#[derive(Debug, Clone)]
pub enum View {
    Pages(Paginator<Page>),
    Help(Paginator<HelpPage>),
    TicTacToe(TicTacToe),
    Memory(MemoryGame),
    Password(PasswordGame),
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            View::Pages(_) => ViewKind::Pages,
            View::Help(_) => ViewKind::Help,
            View::TicTacToe(_) => ViewKind::TicTacToe,
            View::Memory(_) => ViewKind::Memory,
            View::Password(_) => ViewKind::Password,
        }
    }

    /// Apply one interaction from `user`. Paginators accept only their
    /// owner; games enforce their own turn rules.
    pub fn apply(&mut self, owner: UserId, user: UserId, interaction: &Interaction) -> Step {
        match (self, interaction) {
            (View::Pages(_) | View::Help(_), _) if user != owner => Notice::NotSessionOwner.into(),
            (View::Pages(pages), interaction) => pages.apply(interaction),
            (View::Help(pages), interaction) => pages.apply(interaction),
            (View::TicTacToe(game), Interaction::Cell { cell }) => game.play(user, *cell),
            (View::Memory(game), Interaction::Cell { cell }) => game.select(user, *cell),
            (View::Password(game), Interaction::Submit { text }) => game.submit(user, text),
            (_, other) => Notice::UnsupportedAction(other.name()).into(),
        }
    }

    /// Who may close the session early.
    pub fn may_close(&self, owner: UserId, user: UserId) -> bool {
        match self {
            View::TicTacToe(game) => game.is_participant(user),
            _ => user == owner,
        }
    }

    pub fn render(&self) -> Result<RenderedMessage> {
        match self {
            View::Pages(pages) => pages.render(),
            View::Help(pages) => pages.render(),
            View::TicTacToe(game) => Ok(game.render()),
            View::Memory(game) => Ok(game.render()),
            View::Password(game) => Ok(game.render()),
        }
    }

    /// The game reached a win, draw or loss on its own.
    pub fn is_finished(&self) -> bool {
        match self {
            View::Pages(_) | View::Help(_) => false,
            View::TicTacToe(game) => game.state().is_terminal(),
            View::Memory(game) => game.phase() == MemoryPhase::Won,
            View::Password(game) => game.state() == PasswordState::Won,
        }
    }

    pub fn on_idle_timeout(&mut self) {
        match self {
            View::Pages(_) | View::Help(_) => {}
            View::TicTacToe(game) => game.time_out(),
            View::Memory(game) => game.abandon(),
            View::Password(game) => game.abandon(),
        }
    }

    pub fn pending_followup(&self) -> Option<Followup> {
        match self {
            View::Memory(game) => match game.phase() {
                MemoryPhase::Revealing => Some(Followup::EndReveal),
                MemoryPhase::Mismatch { .. } => Some(Followup::HideMismatch),
                _ => None,
            },
            _ => None,
        }
    }

    /// Run a delayed transition. Returns whether anything changed.
    pub fn run_followup(&mut self, followup: Followup) -> bool {
        match (self, followup) {
            (View::Memory(game), Followup::EndReveal) => game.finish_reveal(),
            (View::Memory(game), Followup::HideMismatch) => game.hide_mismatch(),
            _ => false,
        }
    }
}
