//! Opponent lifecycle and coordination.
//!
//! The manager owns up to two players: the active opponent the human is
//! playing against, and a background engine kept warm for hints and
//! dead-stone analysis. Easy games run the in-process minimax searcher;
//! Medium and Hard attach the external engine with a larger thinking
//! budget. Anything that talks to a bot runs on a worker thread and is
//! handed back as a [`Task`], keeping process spawns and protocol
//! round-trips out of the caller's loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};

use crate::board::{Board, Point, Stone};
use crate::bot::{Bot, BotMove, Difficulty};
use crate::bridge::EngineBot;
use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_ENGINE_CMD, EASY_SEARCH_DEPTH, THINK_TIME_BACKGROUND_SECS,
};
use crate::minimax::MinimaxBot;

/// A single unit of bot work running on its own thread.
///
/// The result can be polled with [`try_take`](Task::try_take) or awaited
/// with [`wait`](Task::wait); either way the worker thread is joined once
/// the value is through. Dropping a task joins it too, so results are
/// never abandoned mid-command.
pub struct Task<T> {
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Task<T> {
    fn spawn<F>(name: &str, work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let handle = match thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _ = tx.send(work());
            }) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("failed to spawn worker '{name}': {e}");
                None
            }
        };
        Self { rx, handle }
    }

    /// The result if the work has finished, without blocking.
    pub fn try_take(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => {
                self.join();
                Some(value)
            }
            Err(_) => None,
        }
    }

    /// Block until the work finishes. `None` means the worker died
    /// without producing a value.
    pub fn wait(mut self) -> Option<T> {
        let value = self.rx.recv().ok();
        self.join();
        value
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// How to reach the external engine, and the board it should be set to.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    pub engine_cmd: String,
    pub engine_args: Vec<String>,
    pub board_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            engine_cmd: DEFAULT_ENGINE_CMD.to_string(),
            engine_args: Vec::new(),
            board_size: DEFAULT_BOARD_SIZE,
        }
    }
}

/// Owns the active opponent and the background analysis engine.
pub struct BotManager {
    config: ManagerConfig,
    background: Option<Arc<EngineBot>>,
    active: Option<Arc<dyn Bot>>,
    /// The active opponent is the background engine itself.
    active_is_engine: bool,
    difficulty: Option<Difficulty>,
    ready: Arc<AtomicBool>,
}

impl BotManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            background: None,
            active: None,
            active_is_engine: false,
            difficulty: None,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the last [`select_bot`](Self::select_bot) has finished
    /// preparing the opponent.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The difficulty of the current opponent, if one was selected.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    fn ensure_background(&mut self, size: usize) -> (Arc<EngineBot>, bool) {
        match &self.background {
            Some(engine) => (engine.clone(), false),
            None => {
                log::info!("starting background engine '{}'", self.config.engine_cmd);
                let engine = Arc::new(EngineBot::new(
                    &self.config.engine_cmd,
                    &self.config.engine_args,
                    size,
                ));
                self.background = Some(engine.clone());
                (engine, true)
            }
        }
    }

    /// Bring the background engine up (or re-point it at a new board
    /// size) with the idle thinking budget.
    pub fn start_background(&mut self, size: usize) -> Task<()> {
        let (engine, fresh) = self.ensure_background(size);
        Task::spawn("bg-engine-start", move || {
            if fresh {
                engine.init();
            } else {
                engine.set_board_size(size);
            }
            engine.set_think_time(THINK_TIME_BACKGROUND_SECS);
        })
    }

    /// Swap in the opponent for `difficulty` on a fresh board of `size`.
    /// [`is_ready`](Self::is_ready) flips back to true once the returned
    /// task has prepared it.
    pub fn select_bot(&mut self, difficulty: Difficulty, size: usize) -> Task<()> {
        self.ready.store(false, Ordering::Release);
        self.difficulty = Some(difficulty);
        log::info!("selecting {difficulty} opponent on {size}x{size}");

        let ready = self.ready.clone();
        match difficulty {
            Difficulty::Easy => {
                let bot = Arc::new(MinimaxBot::new(size, EASY_SEARCH_DEPTH));
                self.active = Some(bot.clone());
                self.active_is_engine = false;
                Task::spawn("bot-select", move || {
                    bot.init();
                    ready.store(true, Ordering::Release);
                })
            }
            Difficulty::Medium | Difficulty::Hard => {
                let (engine, fresh) = self.ensure_background(size);
                self.active = Some(engine.clone());
                self.active_is_engine = true;
                let think = difficulty.think_time_secs();
                Task::spawn("bot-select", move || {
                    if fresh {
                        engine.init();
                    } else {
                        engine.set_board_size(size);
                    }
                    engine.set_think_time(think);
                    ready.store(true, Ordering::Release);
                })
            }
        }
    }

    /// Ask the active opponent for its move.
    pub fn request_move(&self, black_to_move: bool) -> Option<Task<BotMove>> {
        let bot = self.active.clone()?;
        Some(Task::spawn("bot-genmove", move || {
            bot.generate_move(black_to_move)
        }))
    }

    /// Mirror a move of `color` into every bot tracking the game.
    pub fn sync_move(&self, color: Stone, x: usize, y: usize) -> Task<()> {
        let active = self.active.clone();
        let background = self.distinct_background();
        Task::spawn("bot-sync", move || {
            if let Some(bot) = active {
                bot.sync_move(color, x, y);
            }
            if let Some(engine) = background {
                engine.sync_move(color, x, y);
            }
        })
    }

    /// Mirror a move the active opponent just generated. Bots that apply
    /// their own generated moves are skipped so the stone is not played
    /// twice on their side.
    pub fn sync_generated(&self, color: Stone, x: usize, y: usize) -> Task<()> {
        let active = self
            .active
            .clone()
            .filter(|bot| !bot.applies_own_moves());
        let background = self.distinct_background();
        Task::spawn("bot-sync", move || {
            if let Some(bot) = active {
                bot.sync_move(color, x, y);
            }
            if let Some(engine) = background {
                engine.sync_move(color, x, y);
            }
        })
    }

    /// Rebuild every bot's board from an authoritative position, after
    /// undo, redo, or loading a saved game.
    pub fn resync(&self, board: &Board) -> Task<()> {
        let active = self.active.clone();
        let background = self.distinct_background();
        let board = board.clone();
        Task::spawn("bot-resync", move || {
            if let Some(bot) = &active {
                bot.load_board(&board);
            }
            if let Some(engine) = &background {
                engine.load_board(&board);
            }
        })
    }

    /// Ask the background engine for a suggested move without disturbing
    /// the game.
    pub fn request_hint(&self, black_to_move: bool) -> Option<Task<BotMove>> {
        let engine = self.background.clone()?;
        let restore = self
            .difficulty
            .filter(|_| self.active_is_engine)
            .map(|d| d.think_time_secs())
            .unwrap_or(THINK_TIME_BACKGROUND_SECS);
        Some(Task::spawn("bot-hint", move || {
            engine.hint_move(black_to_move, restore)
        }))
    }

    /// The background engine's opinion on which stones are dead, for
    /// scoring. Empty when no engine is attached.
    pub fn dead_stones(&self) -> Task<Vec<Point>> {
        let engine = self.background.clone();
        Task::spawn("bot-score", move || match engine {
            Some(engine) => engine.dead_stones(),
            None => Vec::new(),
        })
    }

    /// Drop the opponent and shut the background engine process down.
    pub fn shutdown(&mut self) {
        self.ready.store(false, Ordering::Release);
        self.active = None;
        self.active_is_engine = false;
        self.difficulty = None;
        if let Some(engine) = self.background.take() {
            log::info!("shutting down background engine");
            engine.close();
        }
    }

    /// The background engine, unless it is also the active opponent.
    fn distinct_background(&self) -> Option<Arc<EngineBot>> {
        if self.active_is_engine {
            None
        } else {
            self.background.clone()
        }
    }
}

impl Drop for BotManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_task_wait_returns_value() {
        let task = Task::spawn("test-task", || 41 + 1);
        assert_eq!(task.wait(), Some(42));
    }

    #[test]
    fn test_task_try_take_polls() {
        let mut task = Task::spawn("test-task", || {
            thread::sleep(Duration::from_millis(20));
            "done"
        });
        let mut result = None;
        for _ in 0..200 {
            if let Some(value) = task.try_take() {
                result = Some(value);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(result, Some("done"));
    }

    #[test]
    fn test_request_move_without_opponent() {
        let manager = BotManager::new(ManagerConfig::default());
        assert!(manager.request_move(true).is_none());
        assert!(manager.request_hint(true).is_none());
    }

    #[test]
    fn test_easy_opponent_becomes_ready_and_moves() {
        let mut manager = BotManager::new(ManagerConfig::default());
        assert!(!manager.is_ready());

        manager.select_bot(Difficulty::Easy, 9).wait();
        assert!(manager.is_ready());
        assert_eq!(manager.difficulty(), Some(Difficulty::Easy));

        let task = manager.request_move(true).unwrap();
        assert_eq!(task.wait(), Some(BotMove::Play((4, 4))));
    }

    #[test]
    fn test_easy_opponent_tracks_synced_moves() {
        let mut manager = BotManager::new(ManagerConfig::default());
        manager.select_bot(Difficulty::Easy, 9).wait();

        manager.sync_move(Stone::Black, 4, 4).wait();
        let task = manager.request_move(false).unwrap();
        match task.wait() {
            Some(BotMove::Play((x, y))) => {
                assert_ne!((x, y), (4, 4), "reply landed on an occupied point");
            }
            other => panic!("expected a placement, got {other:?}"),
        }
    }

    #[test]
    fn test_dead_stones_without_engine_is_empty() {
        let manager = BotManager::new(ManagerConfig::default());
        assert_eq!(manager.dead_stones().wait(), Some(Vec::new()));
    }

    #[test]
    fn test_shutdown_without_engine() {
        let mut manager = BotManager::new(ManagerConfig::default());
        manager.select_bot(Difficulty::Easy, 9).wait();
        manager.shutdown();
        assert!(!manager.is_ready());
        assert!(manager.request_move(true).is_none());
    }
}
