//! Raw battle input shapes and the normalized outcome record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BattleId, DeckFingerprint, DECK_SIZE};

/// One card slot as it appears in a raw battle log. The id can be missing
/// when the upstream log is incomplete; such slots are unresolvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCard {
    pub id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elixir: Option<u8>,
}

/// One side of a raw battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_tag: Option<String>,

    #[serde(default)]
    pub crowns: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_trophies: Option<u32>,

    #[serde(default)]
    pub cards: Vec<RawCard>,
}

impl RawSide {
    /// Card ids with a resolvable identifier, in log order.
    pub fn resolvable_card_ids(&self) -> Vec<u32> {
        self.cards.iter().filter_map(|c| c.id).collect()
    }
}

/// A raw battle as supplied by the surrounding collection layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBattle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battle_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<String>,

    pub team: RawSide,
    pub opponent: RawSide,
}

impl RawBattle {
    /// Order-independent identity for this battle, combining the timestamp
    /// with both participants' tags.
    pub fn battle_id(&self) -> BattleId {
        let time = self
            .battle_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let team_tag = self.team.player_tag.as_deref().unwrap_or_default();
        let opp_tag = self.opponent.player_tag.as_deref().unwrap_or_default();
        BattleId::generate(&time, team_tag, opp_tag)
    }
}

/// Which side of a battle a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Team,
    Opponent,
}

/// A normalized, per-side outcome fed to the aggregator.
///
/// Ephemeral: consumed once per aggregation pass, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub battle_id: BattleId,
    pub side: Side,

    /// Canonical fingerprint of this side's deck
    pub fingerprint: DeckFingerprint,

    /// This side's card ids, sorted ascending
    pub card_ids: [u32; DECK_SIZE],

    /// Fingerprint of the opposing deck, when that side was well-formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_fingerprint: Option<DeckFingerprint>,

    /// True iff this side's crowns strictly exceeded the opponent's
    pub won: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trophies: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(tag: &str, crowns: u32, ids: &[u32]) -> RawSide {
        RawSide {
            player_tag: Some(tag.to_string()),
            crowns,
            starting_trophies: Some(6200),
            cards: ids
                .iter()
                .map(|&id| RawCard {
                    id: Some(id),
                    name: None,
                    elixir: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_battle_id_same_from_either_perspective() {
        let time = "2025-06-12T10:15:00Z".parse().unwrap();
        let a = RawBattle {
            battle_time: Some(time),
            game_mode: Some("Ladder".to_string()),
            team: side("#AAA", 2, &[1, 2, 3, 4, 5, 6, 7, 8]),
            opponent: side("#BBB", 1, &[9, 10, 11, 12, 13, 14, 15, 16]),
        };
        // The same battle as it appears in the opponent's log
        let b = RawBattle {
            battle_time: Some(time),
            game_mode: Some("Ladder".to_string()),
            team: side("#BBB", 1, &[9, 10, 11, 12, 13, 14, 15, 16]),
            opponent: side("#AAA", 2, &[1, 2, 3, 4, 5, 6, 7, 8]),
        };

        assert_eq!(a.battle_id(), b.battle_id());
    }

    #[test]
    fn test_resolvable_card_ids_skips_missing() {
        let mut s = side("#AAA", 0, &[1, 2, 3]);
        s.cards.push(RawCard {
            id: None,
            name: Some("Unknown".to_string()),
            elixir: None,
        });

        assert_eq!(s.resolvable_card_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_raw_battle_deserializes_minimal_json() {
        let json = r#"{
            "team": {"crowns": 1, "cards": [{"id": 5}]},
            "opponent": {"crowns": 0}
        }"#;

        let battle: RawBattle = serde_json::from_str(json).unwrap();
        assert!(battle.battle_time.is_none());
        assert_eq!(battle.team.cards.len(), 1);
        assert!(battle.opponent.cards.is_empty());
    }
}
