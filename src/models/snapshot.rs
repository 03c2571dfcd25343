//! Immutable meta snapshots and their stat tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeckFingerprint, Rarity, SnapshotId};

/// Fixed policy classification based on usage/win-rate thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardClassification {
    /// Low usage, high win rate
    Underrated,
    /// High usage, low win rate
    Overrated,
}

/// Per-card statistics within one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardStat {
    pub card_id: u32,

    /// Resolved display name; absent when the id is not in the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,

    pub games: u32,
    pub wins: u32,

    /// Share of all card-usage slots, percent
    pub usage_rate: f64,

    /// Percent of games featuring this card that were won
    pub win_rate: f64,

    /// Usage weighted by win-rate deviation from 50%; only present above
    /// the minimum sample threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<CardClassification>,
}

/// Per-deck statistics within one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckStat {
    pub fingerprint: DeckFingerprint,

    /// Member card ids, ascending
    pub card_ids: Vec<u32>,

    pub avg_elixir: f64,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,

    /// Share of battles in scope using this deck, percent
    pub usage_rate: f64,
}

/// Per-pair synergy statistics within one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStat {
    /// The pair, ascending by card id
    pub card_ids: [u32; 2],
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,

    /// Co-occurrence rate across all battles in scope, percent
    pub synergy_score: f64,
}

/// Per-triple "archetype core" statistics within one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleStat {
    /// The triple, ascending by card id
    pub card_ids: [u32; 3],
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// The immutable result of one aggregation run.
///
/// Created once per run and never mutated; historical snapshots are kept
/// side by side for trend comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaSnapshot {
    pub id: SnapshotId,

    /// Scope label, e.g. "6000-7000/ladder"
    pub scope: String,

    /// Free-form snapshot type tag, e.g. "weekly" or "top-ladder"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_type: Option<String>,

    pub taken_at: DateTime<Utc>,

    /// Total outcome records aggregated
    pub sample_size: u64,

    /// Distinct deck fingerprints observed
    pub total_decks: u64,

    pub cards: Vec<CardStat>,
    pub decks: Vec<DeckStat>,
    pub pairs: Vec<PairStat>,
    pub triples: Vec<TripleStat>,

    /// Rank-Gini balance over card usage, 0-100 (100 = perfectly even)
    pub balance_score: f64,

    /// Shannon-entropy deck diversity, 0-100
    pub diversity_index: f64,

    /// Summed usage rate of the ten most-played decks, percent
    pub top_deck_dominance: f64,
}

impl MetaSnapshot {
    /// Card stats sorted by usage rate, descending.
    pub fn cards_by_usage(&self) -> Vec<&CardStat> {
        let mut sorted: Vec<_> = self.cards.iter().collect();
        sorted.sort_by(|a, b| b.usage_rate.total_cmp(&a.usage_rate));
        sorted
    }

    /// Deck stats sorted by games played, descending.
    pub fn decks_by_games(&self) -> Vec<&DeckStat> {
        let mut sorted: Vec<_> = self.decks.iter().collect();
        sorted.sort_by(|a, b| b.games.cmp(&a.games));
        sorted
    }

    /// Look up a card stat by id.
    pub fn card(&self, card_id: u32) -> Option<&CardStat> {
        self.cards.iter().find(|c| c.card_id == card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> MetaSnapshot {
        MetaSnapshot {
            id: SnapshotId::from("abc123"),
            scope: "all/all".to_string(),
            snapshot_type: Some("weekly".to_string()),
            taken_at: Utc::now(),
            sample_size: 100,
            total_decks: 4,
            cards: vec![
                CardStat {
                    card_id: 1,
                    name: Some("Knight".to_string()),
                    rarity: Some(Rarity::Common),
                    games: 80,
                    wins: 44,
                    usage_rate: 10.0,
                    win_rate: 55.0,
                    meta_score: Some(11.0),
                    classification: None,
                },
                CardStat {
                    card_id: 2,
                    name: None,
                    rarity: None,
                    games: 20,
                    wins: 8,
                    usage_rate: 2.5,
                    win_rate: 40.0,
                    meta_score: None,
                    classification: None,
                },
            ],
            decks: vec![],
            pairs: vec![],
            triples: vec![],
            balance_score: 62.0,
            diversity_index: 71.0,
            top_deck_dominance: 38.5,
        }
    }

    #[test]
    fn test_cards_by_usage_descending() {
        let snapshot = sample_snapshot();
        let sorted = snapshot.cards_by_usage();
        assert_eq!(sorted[0].card_id, 1);
        assert_eq!(sorted[1].card_id, 2);
    }

    #[test]
    fn test_card_lookup() {
        let snapshot = sample_snapshot();
        assert!(snapshot.card(1).is_some());
        assert!(snapshot.card(99).is_none());
    }

    #[test]
    fn test_snapshot_serialization_roundtrip() {
        let snapshot = sample_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let deserialized: MetaSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id, snapshot.id);
        assert_eq!(deserialized.scope, "all/all");
        assert_eq!(deserialized.cards.len(), 2);
        // Unresolved card serializes without a name field
        assert!(!json.contains("\"name\":null"));
    }
}
