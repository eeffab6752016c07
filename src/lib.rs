//! HabitForge - gamification and progression engine
//!
//! XP and leveling, daily streaks with freeze protection, a badge
//! condition engine, seeded PvP duels, and windowed leaderboards over a
//! sorted-set store.

pub mod badges;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod leaderboard;
pub mod progression;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use types::{CompletionEvent, RewardResult, UserId};
