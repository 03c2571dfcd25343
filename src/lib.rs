//! # Royale Meta
//!
//! A Clash Royale battle-log meta aggregation and snapshot engine.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (cards, decks, battles, scopes, snapshots)
//! - **ingest**: Raw battle normalization, dedup, and skip accounting
//! - **aggregate**: Per-card/pair/triple/deck counter accumulation
//! - **calculate**: Derived metrics (rates, synergy, balance, diversity)
//! - **storage**: Append-only JSONL snapshot persistence
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod calculate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod storage;

pub use models::*;

/// Parse a scope label like "6000-7000/ladder", "8000+/all" or "all".
pub fn parse_scope(s: &str) -> Option<Scope> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (trophy, mode) = match s.split_once('/') {
        Some((trophy, mode)) => (trophy, mode),
        None => (s, "all"),
    };

    Some(Scope::new(
        TrophyRange::parse(trophy)?,
        GameModeCategory::parse(mode)?,
    ))
}
