//! Tic-tac-toe with an optional minimax opponent.

use std::fmt;

use serde::Serialize;

use crate::error::CogbotError;
use crate::render::{ActionRow, Button, ButtonStyle, RenderedMessage};
use crate::session::{Notice, Step, UserId};
use crate::Result;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// 3x3 grid in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([Option<Mark>; 9]);

impl Board {
    pub fn from_cells(cells: [Option<Mark>; 9]) -> Self {
        Self(cells)
    }

    /// Parse a 9-character row-major picture such as `"XX_OO____"`.
    pub fn parse(picture: &str) -> Option<Self> {
        let mut cells = [None; 9];
        let mut chars = picture.chars();
        for cell in cells.iter_mut() {
            *cell = match chars.next()? {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '_' | '.' | ' ' => None,
                _ => return None,
            };
        }
        chars.next().is_none().then_some(Self(cells))
    }

    pub fn get(&self, cell: usize) -> Option<Mark> {
        self.0.get(cell).copied().flatten()
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        (0..9).filter(|&i| self.0[i].is_none())
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.0.iter().filter(|c| **c == Some(mark)).count()
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.0[a] {
            Some(mark) if self.0[b] == Some(mark) && self.0[c] == Some(mark) => Some(mark),
            _ => None,
        })
    }

    fn set(&mut self, cell: usize, mark: Option<Mark>) {
        self.0[cell] = mark;
    }
}

/// Who controls a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    User(UserId),
    Ai,
}

impl Player {
    fn label(&self) -> String {
        match self {
            Player::User(id) => id.mention(),
            Player::Ai => "the bot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    InProgress,
    Won(Mark),
    Draw,
    TimedOut,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameState::InProgress)
    }
}

/// Best move for `ai` on `board` by exhaustive minimax.
///
/// Scores are +1 for an `ai` win, -1 for a loss and 0 for a draw. Among
/// equally scored moves the lowest cell index wins.
pub fn best_move(board: &Board, ai: Mark) -> Option<usize> {
    let mut scratch = *board;
    let mut best: Option<(usize, i32)> = None;
    let empty: Vec<usize> = board.empty_cells().collect();
    for cell in empty {
        scratch.set(cell, Some(ai));
        let score = minimax(&mut scratch, ai.other(), ai);
        scratch.set(cell, None);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((cell, score));
        }
    }
    best.map(|(cell, _)| cell)
}

fn minimax(board: &mut Board, to_move: Mark, ai: Mark) -> i32 {
    match board.winner() {
        Some(mark) if mark == ai => return 1,
        Some(_) => return -1,
        None if board.is_full() => return 0,
        None => {}
    }

    let maximizing = to_move == ai;
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for cell in 0..9 {
        if board.get(cell).is_some() {
            continue;
        }
        board.set(cell, Some(to_move));
        let score = minimax(board, to_move.other(), ai);
        board.set(cell, None);
        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }
    best
}

/// One game between two users, or a user and the bot.
///
/// X always moves first. Terminal states are absorbing.
#[derive(Debug, Clone)]
pub struct TicTacToe {
    board: Board,
    x: UserId,
    o: Player,
    turn: Mark,
    state: GameState,
}

impl TicTacToe {
    /// Start a fresh game; the challenger plays X.
    pub fn new(challenger: UserId, opponent: Player) -> Result<Self> {
        Self::with_board(challenger, opponent, Board::default(), Mark::X)
    }

    /// Resume from a given position.
    pub fn with_board(challenger: UserId, opponent: Player, board: Board, turn: Mark) -> Result<Self> {
        if opponent == Player::User(challenger) {
            return Err(CogbotError::InvalidInput(
                "you cannot challenge yourself".into(),
            ));
        }
        let mut game = Self {
            board,
            x: challenger,
            o: opponent,
            turn,
            state: GameState::InProgress,
        };
        game.evaluate(turn.other());
        if game.state == GameState::InProgress {
            game.turn = turn;
        }
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn player(&self, mark: Mark) -> Player {
        match mark {
            Mark::X => Player::User(self.x),
            Mark::O => self.o,
        }
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.x || self.o == Player::User(user)
    }

    /// Place the current player's mark; in AI games the bot answers at once.
    pub fn play(&mut self, user: UserId, cell: usize) -> Step {
        if self.state.is_terminal() {
            return Notice::SessionOver.into();
        }
        if !self.is_participant(user) {
            return Notice::NotSessionOwner.into();
        }
        if self.player(self.turn) != Player::User(user) {
            return Notice::NotYourTurn.into();
        }
        if cell >= 9 {
            return Notice::InvalidCell(cell).into();
        }
        if self.board.get(cell).is_some() {
            return Notice::CellOccupied(cell).into();
        }

        self.place(cell);

        if self.state == GameState::InProgress && self.player(self.turn) == Player::Ai {
            if let Some(reply) = best_move(&self.board, self.turn) {
                self.place(reply);
            }
        }
        Step::Updated
    }

    fn place(&mut self, cell: usize) {
        let mover = self.turn;
        self.board.set(cell, Some(mover));
        self.evaluate(mover);
    }

    fn evaluate(&mut self, mover: Mark) {
        if let Some(winner) = self.board.winner() {
            self.state = GameState::Won(winner);
        } else if self.board.is_full() {
            self.state = GameState::Draw;
        } else {
            self.turn = mover.other();
        }
    }

    /// Idle timeout: the game is abandoned and the board cleared.
    pub fn time_out(&mut self) {
        if self.state == GameState::InProgress {
            self.state = GameState::TimedOut;
            self.board = Board::default();
        }
    }

    pub fn render(&self) -> RenderedMessage {
        let header = format!(
            "{} (X) vs {} (O)",
            Player::User(self.x).label(),
            self.o.label()
        );
        let status = match self.state {
            GameState::InProgress => format!(
                "{}'s turn ({})",
                self.player(self.turn).label(),
                self.turn
            ),
            GameState::Won(mark) => format!("{} wins!", self.player(mark).label()),
            GameState::Draw => "It's a draw!".to_string(),
            GameState::TimedOut => "Nobody moved in time. Game over.".to_string(),
        };

        let terminal = self.state.is_terminal();
        let mut message = RenderedMessage::default().with_content(format!("{header}\n{status}"));
        for row in 0..3 {
            let buttons = (row * 3..row * 3 + 3)
                .map(|cell| {
                    let (label, style) = match self.board.get(cell) {
                        Some(Mark::X) => ("X", ButtonStyle::Danger),
                        Some(Mark::O) => ("O", ButtonStyle::Success),
                        None => ("\u{200b}", ButtonStyle::Secondary),
                    };
                    Button::new(format!("cell:{cell}"), label, style)
                        .disabled(terminal || self.board.get(cell).is_some())
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

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    fn pvp() -> TicTacToe {
        TicTacToe::new(ALICE, Player::User(BOB)).unwrap()
    }

    #[test]
    fn test_self_challenge_rejected() {
        assert!(TicTacToe::new(ALICE, Player::User(ALICE)).is_err());
    }

    #[test]
    fn test_row_win_scenario() {
        let board = Board::parse("XX_OO____").unwrap();
        let mut game = TicTacToe::with_board(ALICE, Player::User(BOB), board, Mark::X).unwrap();
        assert_eq!(game.state(), GameState::InProgress);

        assert_eq!(game.play(ALICE, 2), Step::Updated);
        assert_eq!(game.state(), GameState::Won(Mark::X));
    }

    #[test]
    fn test_turn_order_enforced() {
        let mut game = pvp();
        assert_eq!(game.play(BOB, 0), Step::Notice(Notice::NotYourTurn));
        assert_eq!(game.play(UserId(99), 0), Step::Notice(Notice::NotSessionOwner));
        assert_eq!(game.play(ALICE, 4), Step::Updated);
        assert_eq!(game.turn(), Mark::O);
        assert_eq!(game.play(ALICE, 0), Step::Notice(Notice::NotYourTurn));
    }

    #[test]
    fn test_occupied_and_invalid_cells() {
        let mut game = pvp();
        game.play(ALICE, 4);
        assert_eq!(game.play(BOB, 4), Step::Notice(Notice::CellOccupied(4)));
        assert_eq!(game.play(BOB, 9), Step::Notice(Notice::InvalidCell(9)));
        assert_eq!(game.turn(), Mark::O);
    }

    #[test]
    fn test_draw() {
        let mut game = pvp();
        // X O X / X O O / O X X
        for (user, cell) in [
            (ALICE, 0),
            (BOB, 1),
            (ALICE, 2),
            (BOB, 4),
            (ALICE, 3),
            (BOB, 5),
            (ALICE, 7),
            (BOB, 6),
            (ALICE, 8),
        ] {
            assert_eq!(game.play(user, cell), Step::Updated);
        }
        assert_eq!(game.state(), GameState::Draw);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let board = Board::parse("XX_OO____").unwrap();
        let mut game = TicTacToe::with_board(ALICE, Player::User(BOB), board, Mark::X).unwrap();
        game.play(ALICE, 2);
        let before = *game.board();
        assert_eq!(game.play(BOB, 5), Step::Notice(Notice::SessionOver));
        assert_eq!(*game.board(), before);
        game.time_out();
        assert_eq!(game.state(), GameState::Won(Mark::X));
    }

    #[test]
    fn test_time_out_clears_board() {
        let mut game = pvp();
        game.play(ALICE, 0);
        game.time_out();
        assert_eq!(game.state(), GameState::TimedOut);
        assert_eq!(game.board().empty_cells().count(), 9);
        assert_eq!(game.play(BOB, 1), Step::Notice(Notice::SessionOver));
    }

    #[test]
    fn test_ai_takes_winning_move() {
        // X X _ / O O _ / X _ _ with O (the bot) to move: 5 wins, 2 only blocks.
        let board = Board::parse("XX_OO_X__").unwrap();
        assert_eq!(best_move(&board, Mark::O), Some(5));
    }

    #[test]
    fn test_ai_blocks() {
        let board = Board::parse("XX__O____").unwrap();
        assert_eq!(best_move(&board, Mark::O), Some(2));
    }

    #[test]
    fn test_ai_tie_break_lowest_index() {
        // Every opening move draws under perfect play.
        assert_eq!(best_move(&Board::default(), Mark::X), Some(0));
    }

    #[test]
    fn test_ai_replies_and_never_loses() {
        let mut game = TicTacToe::new(ALICE, Player::Ai).unwrap();
        assert_eq!(game.play(ALICE, 0), Step::Updated);
        assert_eq!(game.board().count(Mark::O), 1);
        assert_eq!(game.turn(), Mark::X);

        // Keep playing the lowest free cell; the bot must never lose.
        while game.state() == GameState::InProgress {
            let cell = game.board().empty_cells().next().unwrap();
            game.play(ALICE, cell);
        }
        assert_ne!(game.state(), GameState::Won(Mark::X));
    }

    #[test]
    fn test_exactly_one_outcome_and_win_needs_three_marks() {
        // Walk every reachable position from the empty board.
        fn walk(board: Board, turn: Mark) {
            let winner = board.winner();
            let outcomes = [
                winner.is_none() && !board.is_full(),
                winner.is_some(),
                winner.is_none() && board.is_full(),
            ];
            assert_eq!(outcomes.iter().filter(|b| **b).count(), 1);
            if let Some(mark) = winner {
                assert!(board.count(mark) >= 3);
                return;
            }
            let empty: Vec<usize> = board.empty_cells().collect();
            for cell in empty {
                let mut next = board;
                next.set(cell, Some(turn));
                walk(next, turn.other());
            }
        }
        walk(Board::default(), Mark::X);
    }

    #[test]
    fn test_render_disables_after_win() {
        let board = Board::parse("XX_OO____").unwrap();
        let mut game = TicTacToe::with_board(ALICE, Player::User(BOB), board, Mark::X).unwrap();
        game.play(ALICE, 2);
        let message = game.render();
        assert_eq!(message.components.len(), 3);
        assert!(message
            .components
            .iter()
            .flat_map(|r| &r.buttons)
            .all(|b| b.disabled));
        assert!(message.content.unwrap().contains("wins"));
    }
}
