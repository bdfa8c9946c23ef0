//! Memory-match grid.
//!
//! A 5x5 board with a locked centre and 12 emoji pairs on the remaining 24
//! cells. The board is shown face-up for a short reveal, then hidden; the
//! player flips two cells at a time until every pair is found.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::render::{ActionRow, Button, ButtonStyle, RenderedMessage};
use crate::session::{Notice, Step, UserId};

pub const GRID_SIZE: usize = 25;
pub const GRID_WIDTH: usize = 5;
pub const LOCKED_CELL: usize = 12;
pub const PAIRS: u8 = 12;

const FACES: [&str; PAIRS as usize] = [
    "🍎", "🍌", "🍇", "🍉", "🍒", "🍑", "🥝", "🍍", "🥥", "🍋", "🍓", "🫐",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPhase {
    /// Every face is visible; input is rejected.
    Revealing,
    Playing,
    /// Two non-matching cells are face-up until the flip-back delay passes.
    Mismatch { first: usize, second: usize },
    Won,
    Abandoned,
}

impl MemoryPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MemoryPhase::Won | MemoryPhase::Abandoned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Locked,
    Hidden,
    FaceUp,
    Matched,
}

#[derive(Debug, Clone)]
pub struct MemoryGame {
    owner: UserId,
    faces: [&'static str; GRID_SIZE],
    tiles: [Tile; GRID_SIZE],
    selected: Option<usize>,
    pairs_found: u8,
    turns: u32,
    phase: MemoryPhase,
}

impl MemoryGame {
    /// Deal a shuffled board. The game starts in the reveal phase.
    pub fn new<R: Rng + ?Sized>(owner: UserId, rng: &mut R) -> Self {
        let mut deck: Vec<&'static str> = FACES.iter().flat_map(|f| [*f, *f]).collect();
        deck.shuffle(rng);

        let mut faces = [""; GRID_SIZE];
        let mut tiles = [Tile::Hidden; GRID_SIZE];
        let mut deck = deck.into_iter();
        for cell in 0..GRID_SIZE {
            if cell == LOCKED_CELL {
                tiles[cell] = Tile::Locked;
            } else {
                faces[cell] = deck.next().unwrap_or_default();
            }
        }

        Self {
            owner,
            faces,
            tiles,
            selected: None,
            pairs_found: 0,
            turns: 0,
            phase: MemoryPhase::Revealing,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn phase(&self) -> MemoryPhase {
        self.phase
    }

    pub fn pairs_found(&self) -> u8 {
        self.pairs_found
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Emoji hidden under `cell`; empty for the locked centre.
    pub fn face(&self, cell: usize) -> &'static str {
        self.faces.get(cell).copied().unwrap_or_default()
    }

    /// End the reveal phase and mask the board.
    pub fn finish_reveal(&mut self) -> bool {
        if self.phase != MemoryPhase::Revealing {
            return false;
        }
        self.phase = MemoryPhase::Playing;
        true
    }

    pub fn select(&mut self, user: UserId, cell: usize) -> Step {
        if self.phase.is_terminal() {
            return Notice::SessionOver.into();
        }
        if user != self.owner {
            return Notice::NotSessionOwner.into();
        }
        if matches!(
            self.phase,
            MemoryPhase::Revealing | MemoryPhase::Mismatch { .. }
        ) {
            return Notice::Busy.into();
        }
        if self.tiles.get(cell) != Some(&Tile::Hidden) {
            return Notice::InvalidCell(cell).into();
        }

        self.tiles[cell] = Tile::FaceUp;
        let Some(first) = self.selected.take() else {
            self.selected = Some(cell);
            return Step::Updated;
        };

        self.turns += 1;
        if self.faces[first] == self.faces[cell] {
            self.tiles[first] = Tile::Matched;
            self.tiles[cell] = Tile::Matched;
            self.pairs_found += 1;
            if self.pairs_found == PAIRS {
                self.phase = MemoryPhase::Won;
            }
        } else {
            self.phase = MemoryPhase::Mismatch {
                first,
                second: cell,
            };
        }
        Step::Updated
    }

    /// Flip a mismatched pair back over.
    pub fn hide_mismatch(&mut self) -> bool {
        let MemoryPhase::Mismatch { first, second } = self.phase else {
            return false;
        };
        self.tiles[first] = Tile::Hidden;
        self.tiles[second] = Tile::Hidden;
        self.phase = MemoryPhase::Playing;
        true
    }

    /// Idle timeout.
    pub fn abandon(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = MemoryPhase::Abandoned;
        }
    }

    pub fn render(&self) -> RenderedMessage {
        let status = match self.phase {
            MemoryPhase::Revealing => "Memorize the board!".to_string(),
            MemoryPhase::Won => format!("All pairs found in {} turns!", self.turns),
            MemoryPhase::Abandoned => "Game abandoned.".to_string(),
            _ => format!(
                "Pairs: {}/{} • Turns: {}",
                self.pairs_found, PAIRS, self.turns
            ),
        };
        let terminal = self.phase.is_terminal();
        let wrong = match self.phase {
            MemoryPhase::Mismatch { first, second } => [Some(first), Some(second)],
            _ => [None, None],
        };

        let mut message = RenderedMessage::default().with_content(status);
        for row in 0..GRID_WIDTH {
            let buttons = (row * GRID_WIDTH..(row + 1) * GRID_WIDTH)
                .map(|cell| {
                    let (label, style, disabled) = match self.tiles[cell] {
                        Tile::Locked => ("🔒", ButtonStyle::Secondary, true),
                        Tile::Matched => (self.faces[cell], ButtonStyle::Success, true),
                        Tile::FaceUp if wrong.contains(&Some(cell)) => {
                            (self.faces[cell], ButtonStyle::Danger, false)
                        }
                        Tile::FaceUp => (self.faces[cell], ButtonStyle::Primary, false),
                        Tile::Hidden if self.phase == MemoryPhase::Revealing => {
                            (self.faces[cell], ButtonStyle::Secondary, false)
                        }
                        Tile::Hidden => ("❔", ButtonStyle::Secondary, false),
                    };
                    Button::new(format!("cell:{cell}"), label, style).disabled(disabled || terminal)
                })
                .collect();
            message = message.with_row(ActionRow::new(buttons));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OWNER: UserId = UserId(10);

    fn game() -> MemoryGame {
        let mut game = MemoryGame::new(OWNER, &mut StdRng::seed_from_u64(7));
        game.finish_reveal();
        game
    }

    fn pairs(game: &MemoryGame) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for a in 0..GRID_SIZE {
            for b in a + 1..GRID_SIZE {
                if a != LOCKED_CELL && b != LOCKED_CELL && game.face(a) == game.face(b) {
                    out.push((a, b));
                }
            }
        }
        out
    }

    fn mismatch(game: &MemoryGame) -> (usize, usize) {
        let a = if LOCKED_CELL == 0 { 1 } else { 0 };
        let b = (0..GRID_SIZE)
            .find(|&b| b != a && b != LOCKED_CELL && game.face(b) != game.face(a))
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_deal_has_twelve_pairs_and_locked_centre() {
        let game = game();
        assert_eq!(pairs(&game).len(), PAIRS as usize);
        assert_eq!(game.face(LOCKED_CELL), "");
    }

    #[test]
    fn test_input_rejected_during_reveal() {
        let mut game = MemoryGame::new(OWNER, &mut StdRng::seed_from_u64(1));
        assert_eq!(game.select(OWNER, 0), Step::Notice(Notice::Busy));
        assert!(game.finish_reveal());
        assert!(!game.finish_reveal());
        assert_eq!(game.select(OWNER, 0), Step::Updated);
    }

    #[test]
    fn test_locked_and_foreign_input() {
        let mut game = game();
        assert_eq!(
            game.select(OWNER, LOCKED_CELL),
            Step::Notice(Notice::InvalidCell(LOCKED_CELL))
        );
        assert_eq!(game.select(UserId(11), 0), Step::Notice(Notice::NotSessionOwner));
        assert_eq!(game.select(OWNER, 25), Step::Notice(Notice::InvalidCell(25)));
    }

    #[test]
    fn test_match_disables_pair() {
        let mut game = game();
        let (a, b) = pairs(&game)[0];
        game.select(OWNER, a);
        assert_eq!(game.select(OWNER, a), Step::Notice(Notice::InvalidCell(a)));
        game.select(OWNER, b);
        assert_eq!(game.pairs_found(), 1);
        assert_eq!(game.phase(), MemoryPhase::Playing);
        assert_eq!(game.select(OWNER, a), Step::Notice(Notice::InvalidCell(a)));
    }

    #[test]
    fn test_mismatch_then_hide() {
        let mut game = game();
        let (a, b) = mismatch(&game);
        game.select(OWNER, a);
        game.select(OWNER, b);
        assert_eq!(game.phase(), MemoryPhase::Mismatch { first: a, second: b });
        assert_eq!(game.select(OWNER, 24), Step::Notice(Notice::Busy));

        let rendered = game.render();
        let flagged = rendered
            .components
            .iter()
            .flat_map(|r| &r.buttons)
            .filter(|b| b.style == ButtonStyle::Danger)
            .count();
        assert_eq!(flagged, 2);

        assert!(game.hide_mismatch());
        assert_eq!(game.phase(), MemoryPhase::Playing);
        assert_eq!(game.pairs_found(), 0);
        // Both cells can be flipped again.
        assert_eq!(game.select(OWNER, a), Step::Updated);
    }

    #[test]
    fn test_full_clear_is_terminal() {
        let mut game = game();
        for (a, b) in pairs(&game) {
            game.select(OWNER, a);
            game.select(OWNER, b);
            assert!(game.pairs_found() <= PAIRS);
        }
        assert_eq!(game.pairs_found(), PAIRS);
        assert_eq!(game.phase(), MemoryPhase::Won);
        assert_eq!(game.turns(), PAIRS as u32);
        assert_eq!(game.select(OWNER, 0), Step::Notice(Notice::SessionOver));
        game.abandon();
        assert_eq!(game.phase(), MemoryPhase::Won);
    }

    #[test]
    fn test_abandon() {
        let mut game = game();
        game.abandon();
        assert_eq!(game.phase(), MemoryPhase::Abandoned);
        assert!(game
            .render()
            .components
            .iter()
            .flat_map(|r| &r.buttons)
            .all(|b| b.disabled));
    }

    #[test]
    fn test_render_reveal_shows_faces() {
        let game = MemoryGame::new(OWNER, &mut StdRng::seed_from_u64(3));
        let message = game.render();
        assert_eq!(message.components.len(), GRID_WIDTH);
        let first = &message.components[0].buttons[0];
        assert_eq!(first.label, game.face(0));
    }
}
