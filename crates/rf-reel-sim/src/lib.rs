//! # rf-reel-sim: Batch Trial Orchestrator
//!
//! Plays large numbers of criteria-constrained trials of a game and writes
//! the artifacts a weight optimizer and a game server consume.
//!
//! ## Architecture
//!
//! ```text
//! BetMode + trial count
//!     │
//!     v
//! allocate() ──► TrialPlan[] { id, criteria, seed }
//!     │
//!     v
//! plan_shards() ──► ShardPlan[]  (threads × batches, contiguous)
//!     │
//!     v
//! ┌─────────────── rayon pool ───────────────┐
//! │ run_shard ──► fragments  (one per shard)   │
//! └────────────────────────────────────────────┘
//!     │  join
//!     v
//! merge_fragments ──► books / lookUpTable / force records
//! ```

pub mod allocation;
pub mod analysis;
pub mod error;
pub mod lookup;
pub mod output;
pub mod runner;
pub mod shard;

pub use allocation::{TrialPlan, allocate, criteria_seed, quota_splits};
pub use analysis::{RunSummary, summarize};
pub use error::{SimError, SimResult};
pub use lookup::{LookupRow, SegmentedRow};
pub use output::OutputLayout;
pub use runner::{BatchRunner, ModeReport, SimSettings};
pub use shard::{ShardPlan, plan_shards};
