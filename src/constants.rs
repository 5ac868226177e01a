//! Constants for board geometry, search weights, and protocol parameters.
//!
//! This module gathers all the tunable configuration for the engine.
//! Board size is a runtime value (9, 13, or 19); everything else here is
//! fixed at compile time.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board sizes the engine accepts. Standard Go sizes.
pub const SUPPORTED_SIZES: [usize; 3] = [9, 13, 19];

/// Default board size for a new game.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Default komi (compensation points for White).
pub const DEFAULT_KOMI: f32 = 6.5;

// =============================================================================
// GTP Protocol
// =============================================================================

/// Column letters in Go coordinate notation. 'I' is skipped by convention.
pub const GTP_COLUMNS: &str = "ABCDEFGHJKLMNOPQRST";

/// How long to wait for a complete response to a single engine command.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(20);

/// A freshly spawned engine is considered ready once its startup chatter
/// has been quiet for this long.
pub const STARTUP_QUIET: Duration = Duration::from_millis(1500);

/// Upper bound on the whole startup drain, quiet or not.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// How long to wait for the engine process to exit after `quit` before
/// killing it.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// External engine executable, used when no explicit command is configured.
pub const DEFAULT_ENGINE_CMD: &str = "pachi";

// =============================================================================
// Opponent Think Times (byoyomi seconds per move)
// =============================================================================

/// Think time for the background engine when idle (hints, scoring).
pub const THINK_TIME_BACKGROUND_SECS: u32 = 1;

/// Easy think time. The Easy opponent runs in process and is depth
/// limited, so this only keeps the difficulty mapping total.
pub const THINK_TIME_EASY_SECS: u32 = 1;

/// Medium think time.
pub const THINK_TIME_MEDIUM_SECS: u32 = 4;

/// Hard think time, also used while computing a hint.
pub const THINK_TIME_HARD_SECS: u32 = 8;

// =============================================================================
// Local Search AI
// =============================================================================

/// Minimax depth for the Easy opponent.
pub const EASY_SEARCH_DEPTH: usize = 1;

/// Score assigned to each of the searcher's own stones.
pub const OWN_STONE_SCORE: i32 = 10;

/// Penalty when one of the searcher's groups is down to a single liberty.
pub const OWN_ATARI_PENALTY: i32 = 500;

/// Bonus for own groups with this many liberties or more.
pub const STRONG_GROUP_BONUS: i32 = 50;

/// Liberty count at which a group earns [`STRONG_GROUP_BONUS`].
pub const STRONG_GROUP_LIBS: usize = 4;

/// Score subtracted for each enemy stone.
pub const ENEMY_STONE_SCORE: i32 = 10;

/// Bonus when an enemy group is down to a single liberty.
pub const ENEMY_ATARI_BONUS: i32 = 600;

/// Per-stone bonus added at the root for candidates that capture.
pub const CAPTURE_BONUS: i32 = 1000;

/// Percent chance that a later equally-scored candidate replaces the
/// incumbent best move.
pub const TIE_BREAK_PERCENT: u32 = 30;

/// Sentinel for alpha-beta bounds.
pub const SCORE_INF: i32 = 1_000_000_000;
