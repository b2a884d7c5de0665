//! # rf-reel-math: Reel Game Outcome Engine
//!
//! Plays seeded game rounds of a reel game and records every round as a
//! replayable book of events.
//!
//! ## Features
//!
//! - **Game files**: YAML/JSON game definitions with reel CSVs, validated on load
//! - **Boards**: weighted reel-set draws, forced scatter placement, anticipation
//! - **Win mechanisms**: cluster, lines, ways and pay-anywhere scatter evaluation
//! - **Tumbles**: exploding wins refilled from the strips above
//! - **Trials**: criteria-constrained rounds with rejection and force records
//!
//! ## Architecture
//!
//! ```text
//! GameConfig (config/)
//!     │
//!     ├── SymbolStorage ──► Symbol instances
//!     ├── ReelStrip sets
//!     └── BetMode ──► Distribution (criteria, conditions)
//!           │
//!           v
//!     TrialController::run_trial(id, criteria, seed)
//!           │
//!           ├── BoardGenerator ──► Board
//!           ├── WinEvaluator ──► WinData ──► ForceRecorder
//!           ├── tumble_board
//!           └── WinManager
//!           │
//!           v
//!     Book { events[], payoutMultiplier }
//! ```

pub mod board;
pub mod book;
pub mod config;
pub mod error;
pub mod events;
pub mod presets;
pub mod random;
pub mod recorder;
pub mod symbols;
pub mod trial;
pub mod tumble;
pub mod win_manager;
pub mod wins;

pub use board::{Board, BoardGenerator, ForceTarget, Position};
pub use book::Book;
pub use config::{BetMode, ConfigLimits, Distribution, GameConfig, GameConfigFile, GameType};
pub use error::{ReelError, ReelResult};
pub use events::{Event, EventKind};
pub use recorder::{ForceDescription, ForceEntry, ForceRecord, ForceRecorder, SearchTerm};
pub use symbols::{Symbol, SymbolRole, SymbolStorage};
pub use trial::{RejectReason, TrialController, TrialOutcome, ZERO_CRITERIA};
pub use win_manager::WinManager;
pub use wins::{WinData, WinEvaluator, WinRecord, evaluator_for};
