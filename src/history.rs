//! Completion history queries
//!
//! Read-side capability handed to badge condition evaluators. The
//! surrounding system supplies the friend count; everything else is
//! derived from completion and combat history.

use crate::types::UserId;

/// Queries over a user's accumulated activity
pub trait HistoryQuery: Send + Sync {
    /// Completions so far, optionally restricted to one category
    fn completion_count(&self, user: UserId, category: Option<&str>) -> u64;

    /// Completions whose hour-of-day fell in `[start_hour, end_hour]`
    fn completions_in_hours(&self, user: UserId, start_hour: u32, end_hour: u32) -> u64;

    fn combat_wins(&self, user: UserId) -> u64;

    /// Accepted friendships, resolved by the social collaborator
    fn friend_count(&self, user: UserId) -> u64;

    /// Times the user's streak has broken
    fn streak_breaks(&self, user: UserId) -> u64;

    /// Returns after an absence of a week or more
    fn comebacks(&self, user: UserId) -> u64;
}
