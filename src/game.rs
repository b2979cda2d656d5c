use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::ai::{MoveSelector, PositionalSelector};
use crate::board::{Board, squares};
use crate::config::{Difficulty, GameConfig};
use crate::error::MoveRejected;
use crate::rules::{
    has_any_legal_move, is_legal_move, legal_positions, resolve_move_with_flips,
};
use crate::scheduler::{ManualScheduler, Scheduler, Task, TaskHandle};
use crate::types::{GameResult, GameState, Phase, Player, Position};

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Notifications for the presentation layer, drained with
/// [`GameSession::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    /// `placed` is `None` when a whole new position was loaded.
    #[serde(rename_all = "camelCase")]
    BoardChanged {
        player: Option<Player>,
        placed: Option<Position>,
        flipped: Vec<Position>,
    },
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        phase: Phase,
        current_player: Player,
        is_pass: bool,
        result: Option<GameResult>,
    },
    #[serde(rename_all = "camelCase")]
    CountdownTick { remaining_secs: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    remaining: u32,
    handle: TaskHandle,
}

/// One game between the human (black) and the computer (white).
pub struct GameSession<S: Scheduler = ManualScheduler> {
    board: Board,
    phase: Phase,
    current_player: Player,
    config: GameConfig,
    is_pass: bool,
    flipped: Vec<u8>,
    countdown: Option<Countdown>,
    computer_task: Option<TaskHandle>,
    selector: Box<dyn MoveSelector>,
    rng: SmallRng,
    scheduler: S,
    events: Vec<GameEvent>,
}

impl<S: Scheduler> GameSession<S> {
    pub fn new(config: GameConfig, scheduler: S) -> Self {
        Self::with_selector(config, scheduler, Box::new(PositionalSelector))
    }

    pub fn with_selector(config: GameConfig, scheduler: S, selector: Box<dyn MoveSelector>) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut session = Self {
            board: Board::new(),
            phase: Phase::HumanTurn,
            current_player: Player::HUMAN,
            config,
            is_pass: false,
            flipped: Vec::new(),
            countdown: None,
            computer_task: None,
            selector,
            rng,
            scheduler,
            events: Vec::new(),
        };
        session.reset();
        session
    }

    /// Discards the current game, including any pending countdown or
    /// computer move, and starts over from the initial position.
    #[instrument(skip(self))]
    pub fn start_new_game(&mut self, difficulty: Difficulty, time_limit_secs: u32) {
        self.config.difficulty = difficulty;
        self.config.time_limit_secs = time_limit_secs;
        self.reset();
    }

    /// Loads an arbitrary position with `to_move` to play. Passes and game
    /// end are resolved immediately.
    pub fn set_position(&mut self, board: Board, to_move: Player) {
        self.cancel_pending();
        self.board = board;
        self.flipped.clear();
        self.events.push(GameEvent::BoardChanged {
            player: None,
            placed: None,
            flipped: Vec::new(),
        });

        if has_any_legal_move(&self.board, to_move) {
            self.enter_turn(to_move, false);
        } else if has_any_legal_move(&self.board, to_move.opponent()) {
            self.enter_turn(to_move.opponent(), true);
        } else {
            self.finish();
        }
    }

    /// Plays the human's move. Accepted iff `Ok`; a rejection leaves the
    /// session untouched.
    #[instrument(skip(self))]
    pub fn submit_human_move(&mut self, row: u8, col: u8) -> Result<(), MoveRejected> {
        let pos = self.check_human_move(row, col).inspect_err(|err| {
            debug!(%err, "human move rejected");
        })?;
        self.play_human(pos);
        Ok(())
    }

    /// Delivers a task that came due. Returns `false` for handles that were
    /// canceled or superseded; those never change state.
    #[instrument(skip(self))]
    pub fn fire(&mut self, handle: TaskHandle) -> bool {
        if self.countdown.is_some_and(|c| c.handle == handle) {
            self.on_countdown_tick();
            true
        } else if self.computer_task == Some(handle) {
            self.computer_task = None;
            self.play_computer();
            true
        } else {
            trace!(handle = handle.id(), "ignoring stale task");
            false
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The side to move; after game over, the side that would have moved.
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// `Some` once the game is over.
    pub fn result(&self) -> Option<GameResult> {
        self.is_game_over().then(|| self.tally())
    }

    /// Disc counts and the side currently ahead.
    pub fn tally(&self) -> GameResult {
        let (black_count, white_count) = self.board.count();
        GameResult::from_counts(black_count, white_count)
    }

    /// `None` while no countdown is running.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining)
    }

    pub fn is_pass(&self) -> bool {
        self.is_pass
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    /// Legal moves of the side to move. Empty after game over.
    pub fn legal_moves(&self) -> Vec<Position> {
        if self.is_game_over() {
            Vec::new()
        } else {
            legal_positions(&self.board, self.current_player)
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn to_game_state(&self) -> GameState {
        let (black_count, white_count) = self.board.count();
        GameState {
            board: self.board.to_array().to_vec(),
            phase: self.phase,
            current_player: self.current_player.code(),
            black_count,
            white_count,
            is_game_over: self.is_game_over(),
            is_pass: self.is_pass,
            flipped: self.flipped.clone(),
            remaining_seconds: self.remaining_seconds(),
        }
    }

    fn reset(&mut self) {
        self.cancel_pending();
        self.board = Board::new();
        self.is_pass = false;
        self.flipped.clear();
        self.events.push(GameEvent::BoardChanged {
            player: None,
            placed: None,
            flipped: Vec::new(),
        });
        debug!(
            difficulty = %self.config.difficulty,
            time_limit_secs = self.config.time_limit_secs,
            "new game"
        );
        self.enter_turn(Player::HUMAN, false);
    }

    fn check_human_move(&self, row: u8, col: u8) -> Result<Position, MoveRejected> {
        if self.is_game_over() {
            return Err(MoveRejected::GameOver);
        }
        if self.phase != Phase::HumanTurn {
            return Err(MoveRejected::NotHumanTurn);
        }
        let pos = Position::new(row, col).ok_or(MoveRejected::OutOfBounds { row, col })?;
        if !is_legal_move(&self.board, pos, Player::HUMAN) {
            return Err(MoveRejected::IllegalMove { row, col });
        }
        Ok(pos)
    }

    fn play_human(&mut self, pos: Position) {
        self.cancel_countdown();
        self.apply_move(pos, Player::HUMAN);
        self.after_move(Player::HUMAN);
    }

    fn play_computer(&mut self) {
        if self.phase != Phase::ComputerTurn {
            return;
        }

        let selected = self.selector.select_move(
            &self.board,
            Player::COMPUTER,
            self.config.difficulty,
            &mut self.rng,
        );
        let pos = match selected {
            Some(pos) if is_legal_move(&self.board, pos, Player::COMPUTER) => pos,
            other => panic!("move selector returned {other:?}, which is not a legal computer move"),
        };

        self.apply_move(pos, Player::COMPUTER);
        self.after_move(Player::COMPUTER);
    }

    fn on_countdown_tick(&mut self) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };

        countdown.remaining = countdown.remaining.saturating_sub(1);
        let remaining = countdown.remaining;
        self.events.push(GameEvent::CountdownTick {
            remaining_secs: remaining,
        });

        if remaining > 0 {
            countdown.handle = self.scheduler.schedule(Task::CountdownTick, COUNTDOWN_TICK);
            return;
        }

        self.countdown = None;
        self.force_random_move();
    }

    fn force_random_move(&mut self) {
        let legal = legal_positions(&self.board, Player::HUMAN);
        match legal.choose(&mut self.rng).copied() {
            Some(pos) => {
                debug!(row = pos.row, col = pos.col, "countdown expired, forcing move");
                self.play_human(pos);
            }
            None => {
                // The countdown is only armed when the human can move.
                warn!("countdown expired without a legal human move");
                self.after_move(Player::HUMAN);
            }
        }
    }

    fn apply_move(&mut self, pos: Position, player: Player) {
        let (board, flips) = resolve_move_with_flips(&self.board, pos, player);
        self.board = board;
        self.flipped = squares(flips).map(|idx| idx as u8).collect();

        debug!(?player, row = pos.row, col = pos.col, flipped = self.flipped.len(), "move applied");
        self.events.push(GameEvent::BoardChanged {
            player: Some(player),
            placed: Some(pos),
            flipped: squares(flips).map(Position::from_index).collect(),
        });
    }

    /// Hands the turn to the opponent, back to `mover` if the opponent must
    /// pass, or ends the game.
    fn after_move(&mut self, mover: Player) {
        let opponent = mover.opponent();
        if has_any_legal_move(&self.board, opponent) {
            self.enter_turn(opponent, false);
        } else if has_any_legal_move(&self.board, mover) {
            debug!(passing = ?opponent, "no legal move, turn passes");
            self.enter_turn(mover, true);
        } else {
            self.finish();
        }
    }

    fn enter_turn(&mut self, player: Player, is_pass: bool) {
        self.current_player = player;
        self.is_pass = is_pass;
        self.phase = match player {
            Player::Black => Phase::HumanTurn,
            Player::White => Phase::ComputerTurn,
        };
        self.push_status();

        match self.phase {
            Phase::HumanTurn => self.arm_countdown(),
            Phase::ComputerTurn => {
                let handle = self
                    .scheduler
                    .schedule(Task::ComputerMove, self.config.computer_delay());
                self.computer_task = Some(handle);
            }
            Phase::GameOver => {}
        }
    }

    fn finish(&mut self) {
        self.cancel_pending();
        self.phase = Phase::GameOver;
        let result = self.tally();
        debug!(
            winner = ?result.winner,
            black = result.black_count,
            white = result.white_count,
            "game over"
        );
        self.push_status();
    }

    fn arm_countdown(&mut self) {
        self.cancel_countdown();
        if !self.config.has_countdown() {
            return;
        }

        let remaining = self.config.time_limit_secs;
        let handle = self.scheduler.schedule(Task::CountdownTick, COUNTDOWN_TICK);
        self.countdown = Some(Countdown { remaining, handle });
        self.events.push(GameEvent::CountdownTick {
            remaining_secs: remaining,
        });
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            self.scheduler.cancel(countdown.handle);
        }
    }

    fn cancel_pending(&mut self) {
        self.cancel_countdown();
        if let Some(handle) = self.computer_task.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn push_status(&mut self) {
        self.events.push(GameEvent::StatusChanged {
            phase: self.phase,
            current_player: self.current_player,
            is_pass: self.is_pass,
            result: self.result(),
        });
    }
}

impl GameSession<ManualScheduler> {
    /// Moves the virtual clock forward by `by`, firing every task that comes
    /// due on the way, including ones scheduled by earlier tasks. Returns how
    /// many tasks fired.
    pub fn advance(&mut self, by: Duration) -> usize {
        let until = self.scheduler.now() + by;
        let mut fired = 0;
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            trace!(?task, handle = handle.id(), "task due");
            if self.fire(handle) {
                fired += 1;
            }
        }
        self.scheduler.set_now(until);
        fired
    }
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;
    use crate::board::BOARD_SIZE;

    const FULL_BOARD: u64 = u64::MAX;
    const DELAY: Duration = Duration::from_millis(1000);

    struct FixedMoveSelector {
        mv: Position,
    }

    impl MoveSelector for FixedMoveSelector {
        fn select_move(
            &self,
            _board: &Board,
            _player: Player,
            _difficulty: Difficulty,
            _rng: &mut dyn RngCore,
        ) -> Option<Position> {
            Some(self.mv)
        }
    }

    fn bit(row: usize, col: usize) -> u64 {
        1u64 << (row * BOARD_SIZE + col)
    }

    fn config(time_limit_secs: u32) -> GameConfig {
        GameConfig::new(Difficulty::Hard, time_limit_secs).with_seed(11)
    }

    fn session(time_limit_secs: u32) -> GameSession {
        GameSession::new(config(time_limit_secs), ManualScheduler::new())
    }

    #[test]
    fn initial_state_is_correct() {
        let game = session(0);
        let state = game.to_game_state();

        assert_eq!(state.phase, Phase::HumanTurn);
        assert_eq!(state.current_player, Player::Black.code());
        assert_eq!(state.black_count, 2);
        assert_eq!(state.white_count, 2);
        assert!(!state.is_game_over);
        assert!(!state.is_pass);
        assert!(state.flipped.is_empty());
        assert_eq!(state.remaining_seconds, None);
        assert_eq!(game.legal_moves().len(), 4);
    }

    #[test]
    fn new_game_emits_board_then_status() {
        let mut game = session(0);

        let events = game.drain_events();

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GameEvent::BoardChanged { placed: None, .. }));
        assert!(matches!(
            events[1],
            GameEvent::StatusChanged {
                phase: Phase::HumanTurn,
                ..
            }
        ));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn illegal_player_move_is_rejected_without_state_change() {
        let mut game = session(0);
        let before = game.to_game_state();
        game.drain_events();

        assert_eq!(
            game.submit_human_move(0, 0),
            Err(MoveRejected::IllegalMove { row: 0, col: 0 })
        );
        assert_eq!(
            game.submit_human_move(8, 3),
            Err(MoveRejected::OutOfBounds { row: 8, col: 3 })
        );
        assert_eq!(game.to_game_state(), before);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn human_move_hands_turn_to_computer_after_delay() {
        let mut game = session(0);

        game.submit_human_move(3, 2).unwrap();

        assert_eq!(game.phase(), Phase::ComputerTurn);
        assert_eq!(game.to_game_state().flipped, vec![27]);
        assert_eq!(game.submit_human_move(2, 3), Err(MoveRejected::NotHumanTurn));

        assert_eq!(game.advance(DELAY - Duration::from_millis(1)), 0);
        assert_eq!(game.phase(), Phase::ComputerTurn);

        assert_eq!(game.advance(Duration::from_millis(1)), 1);
        assert_eq!(game.phase(), Phase::HumanTurn);
        let (black, white) = game.board().count();
        assert_eq!(black + white, 6);
    }

    #[test]
    fn stale_computer_handle_is_ignored() {
        let mut game = session(0);
        game.submit_human_move(3, 2).unwrap();
        let handle = game.computer_task.unwrap();
        game.advance(DELAY);
        let after = game.to_game_state();

        assert!(!game.fire(handle));
        assert_eq!(game.to_game_state(), after);
    }

    #[test]
    fn canceled_countdown_tick_cannot_fire_after_move() {
        let mut game = session(5);
        let tick = game.countdown.unwrap().handle;

        game.submit_human_move(3, 2).unwrap();

        assert_eq!(game.remaining_seconds(), None);
        assert!(!game.scheduler().is_pending(tick));
        assert!(!game.fire(tick));
        assert_eq!(game.phase(), Phase::ComputerTurn);
    }

    #[test]
    fn countdown_ticks_down_each_second() {
        let mut game = session(3);
        game.drain_events();

        game.advance(COUNTDOWN_TICK);
        assert_eq!(game.remaining_seconds(), Some(2));
        game.advance(COUNTDOWN_TICK);
        assert_eq!(game.remaining_seconds(), Some(1));

        let ticks: Vec<u32> = game
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::CountdownTick { remaining_secs } => Some(remaining_secs),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![2, 1]);
    }

    #[test]
    fn countdown_expiry_forces_one_random_move() {
        let mut game = session(1);

        game.advance(COUNTDOWN_TICK);

        assert_eq!(game.phase(), Phase::ComputerTurn);
        assert_eq!(game.board().count(), (4, 1));
        assert_eq!(game.remaining_seconds(), None);
        assert_eq!(
            game.scheduler().pending_tasks().iter().map(|(_, t)| *t).collect::<Vec<_>>(),
            vec![Task::ComputerMove]
        );
    }

    #[test]
    fn computer_pass_returns_turn_to_human() {
        let mut game = session(0);
        // B W . W : black takes (0,2), leaving white without a move.
        let board = Board::from_bitboards(bit(0, 0), bit(0, 1) | bit(0, 3));
        game.set_position(board, Player::Black);

        game.submit_human_move(0, 2).unwrap();

        assert_eq!(game.phase(), Phase::HumanTurn);
        assert!(game.is_pass());
        assert!(game.to_game_state().is_pass);

        game.submit_human_move(0, 4).unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.result().unwrap().winner, Some(Player::Black));
    }

    #[test]
    fn human_pass_lets_computer_move_again() {
        let mut game = session(0);
        let board = Board::from_bitboards(bit(0, 1) | bit(0, 3), bit(0, 0));
        game.set_position(board, Player::White);
        assert_eq!(game.phase(), Phase::ComputerTurn);

        game.advance(DELAY);
        assert_eq!(game.phase(), Phase::ComputerTurn);
        assert!(game.is_pass());

        game.advance(DELAY);
        let result = game.result().unwrap();
        assert_eq!(result.winner, Some(Player::White));
        assert_eq!((result.black_count, result.white_count), (0, 5));
    }

    #[test]
    fn set_position_passes_when_side_to_move_is_stuck() {
        let mut game = session(0);
        let black = bit(0, 1);
        let white = FULL_BOARD ^ bit(0, 0) ^ black;

        game.set_position(Board::from_bitboards(black, white), Player::Black);

        assert_eq!(game.phase(), Phase::ComputerTurn);
        assert!(game.is_pass());
    }

    #[test]
    fn full_board_after_move_sets_game_over() {
        let selector = Box::new(FixedMoveSelector {
            mv: Position::new(0, 0).unwrap(),
        });
        let mut game = GameSession::with_selector(config(0), ManualScheduler::new(), selector);
        let black = bit(0, 1);
        let white = FULL_BOARD ^ bit(0, 0) ^ black;
        game.set_position(Board::from_bitboards(black, white), Player::White);

        game.advance(DELAY);
        let state = game.to_game_state();

        assert!(state.is_game_over);
        assert_eq!(state.black_count, 0);
        assert_eq!(state.white_count, 64);
        assert_eq!(state.flipped, vec![1]);
        assert_eq!(game.scheduler().pending_len(), 0);
    }

    #[test]
    fn full_board_position_is_terminal_and_scored() {
        let mut game = session(10);
        let black = 0x0000_0000_FFFF_FFFF;

        game.set_position(Board::from_bitboards(black, !black), Player::Black);

        assert!(game.is_game_over());
        assert!(game.result().unwrap().is_draw());
        assert_eq!(game.remaining_seconds(), None);
        assert_eq!(game.submit_human_move(0, 0), Err(MoveRejected::GameOver));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    #[should_panic(expected = "not a legal computer move")]
    fn selector_returning_illegal_move_is_a_contract_breach() {
        let selector = Box::new(FixedMoveSelector {
            mv: Position::new(0, 0).unwrap(),
        });
        let mut game = GameSession::with_selector(config(0), ManualScheduler::new(), selector);
        game.submit_human_move(3, 2).unwrap();

        game.advance(DELAY);
    }

    #[test]
    fn start_new_game_cancels_pending_tasks() {
        let mut game = session(0);
        game.submit_human_move(3, 2).unwrap();
        let stale = game.computer_task.unwrap();

        game.start_new_game(Difficulty::Easy, 30);

        assert_eq!(game.phase(), Phase::HumanTurn);
        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.difficulty(), Difficulty::Easy);
        assert_eq!(game.remaining_seconds(), Some(30));
        assert!(!game.scheduler().is_pending(stale));
        assert_eq!(game.scheduler().pending_len(), 1);
    }
}
