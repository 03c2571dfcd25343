//! Battle ingestion: normalizes raw battles into per-side outcome records.
//!
//! Each raw battle yields zero, one, or two records (one per well-formed
//! side). Ingestion is idempotent: the dedup key is the order-independent
//! battle id plus the side, so re-ingesting the same battle (or the same
//! battle seen from the other participant's log) changes nothing.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::models::{
    BattleId, DeckFingerprint, OutcomeRecord, RawBattle, RawSide, Side, sorted_deck,
};

/// Running counts for one ingestion pass, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Raw battles seen, including duplicates
    pub battles_seen: u64,

    /// Outcome records produced
    pub records_produced: u64,

    /// Sides dropped for a malformed deck (wrong size, duplicate or
    /// unresolvable card ids)
    pub sides_skipped: u64,

    /// Battle sides dropped because they were already ingested
    pub duplicates_skipped: u64,
}

/// Stateful ingestor for one aggregation pass.
///
/// The dedup key identifies the physical participant (player tag when
/// present), not the log position: the same player appears as "team" in
/// their own log and "opponent" in the other player's log.
#[derive(Debug, Default)]
pub struct Ingestor {
    seen: HashSet<(BattleId, String)>,
    stats: IngestStats,
}

fn side_key(side: Side, own: &RawSide) -> String {
    match &own.player_tag {
        Some(tag) => tag.clone(),
        None => match side {
            Side::Team => "team".to_string(),
            Side::Opponent => "opponent".to_string(),
        },
    }
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one raw battle into outcome records.
    ///
    /// A malformed side is skipped without blocking the other side; a tie
    /// in crowns is a loss for both sides.
    pub fn ingest(&mut self, battle: &RawBattle) -> Vec<OutcomeRecord> {
        self.stats.battles_seen += 1;
        let battle_id = battle.battle_id();

        let mut records = Vec::with_capacity(2);
        let sides = [
            (Side::Team, &battle.team, &battle.opponent),
            (Side::Opponent, &battle.opponent, &battle.team),
        ];

        for (side, own, other) in sides {
            match self.normalize_side(battle, &battle_id, side, own, other) {
                Some(record) => records.push(record),
                None => trace!(battle_id = %battle_id, ?side, "side skipped"),
            }
        }

        self.stats.records_produced += records.len() as u64;
        records
    }

    fn normalize_side(
        &mut self,
        battle: &RawBattle,
        battle_id: &BattleId,
        side: Side,
        own: &RawSide,
        other: &RawSide,
    ) -> Option<OutcomeRecord> {
        let card_ids = match sorted_deck(&own.resolvable_card_ids()) {
            Ok(ids) => ids,
            Err(err) => {
                debug!(battle_id = %battle_id, ?side, %err, "malformed deck");
                self.stats.sides_skipped += 1;
                return None;
            }
        };

        if !self.seen.insert((battle_id.clone(), side_key(side, own))) {
            self.stats.duplicates_skipped += 1;
            return None;
        }

        // Fingerprinting sorted distinct ids cannot fail; avoid unwrap anyway.
        let fingerprint = DeckFingerprint::from_cards(&card_ids).ok()?;
        let opponent_fingerprint = sorted_deck(&other.resolvable_card_ids())
            .ok()
            .and_then(|ids| DeckFingerprint::from_cards(&ids).ok());

        Some(OutcomeRecord {
            battle_id: battle_id.clone(),
            side,
            fingerprint,
            card_ids,
            opponent_fingerprint,
            won: own.crowns > other.crowns,
            trophies: own.starting_trophies,
            game_mode: battle.game_mode.clone(),
            battle_time: battle.battle_time,
        })
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawCard;
    use chrono::{TimeZone, Utc};

    fn raw_side(tag: &str, crowns: u32, ids: &[u32]) -> RawSide {
        RawSide {
            player_tag: Some(tag.to_string()),
            crowns,
            starting_trophies: Some(6500),
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

    fn raw_battle(team_crowns: u32, opp_crowns: u32) -> RawBattle {
        RawBattle {
            battle_time: Some(Utc.with_ymd_and_hms(2025, 6, 12, 10, 15, 0).unwrap()),
            game_mode: Some("PvP".to_string()),
            team: raw_side("#AAA", team_crowns, &[1, 2, 3, 4, 5, 6, 7, 8]),
            opponent: raw_side("#BBB", opp_crowns, &[9, 10, 11, 12, 13, 14, 15, 16]),
        }
    }

    #[test]
    fn test_ingest_produces_two_records() {
        let mut ingestor = Ingestor::new();
        let records = ingestor.ingest(&raw_battle(2, 1));

        assert_eq!(records.len(), 2);
        assert!(records[0].won);
        assert!(!records[1].won);
        assert_eq!(records[0].side, Side::Team);
        assert_eq!(records[1].side, Side::Opponent);
        assert_eq!(ingestor.stats().records_produced, 2);
    }

    #[test]
    fn test_tie_is_a_loss_for_both_sides() {
        let mut ingestor = Ingestor::new();
        let records = ingestor.ingest(&raw_battle(1, 1));

        assert_eq!(records.len(), 2);
        assert!(!records[0].won);
        assert!(!records[1].won);
    }

    #[test]
    fn test_reingestion_is_idempotent() {
        let mut ingestor = Ingestor::new();
        let battle = raw_battle(2, 0);

        let first = ingestor.ingest(&battle);
        let second = ingestor.ingest(&battle);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(ingestor.stats().duplicates_skipped, 2);
        assert_eq!(ingestor.stats().records_produced, 2);
    }

    #[test]
    fn test_same_battle_from_other_perspective_is_duplicate() {
        let mut ingestor = Ingestor::new();
        let battle = raw_battle(2, 0);

        // Swap sides: the opponent's log of the same battle
        let mirrored = RawBattle {
            battle_time: battle.battle_time,
            game_mode: battle.game_mode.clone(),
            team: battle.opponent.clone(),
            opponent: battle.team.clone(),
        };

        // Both participants were already counted from the first log, so the
        // mirrored view contributes nothing.
        let first = ingestor.ingest(&battle);
        let mirrored_records = ingestor.ingest(&mirrored);

        assert_eq!(first.len(), 2);
        assert!(mirrored_records.is_empty());
        assert_eq!(ingestor.stats().duplicates_skipped, 2);
    }

    #[test]
    fn test_malformed_side_does_not_block_other_side() {
        let mut ingestor = Ingestor::new();
        let mut battle = raw_battle(0, 2);
        battle.team.cards.truncate(7); // Losing side has 7 resolvable cards

        let records = ingestor.ingest(&battle);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].side, Side::Opponent);
        assert!(records[0].won);
        assert!(records[0].opponent_fingerprint.is_none());
        assert_eq!(ingestor.stats().sides_skipped, 1);
    }

    #[test]
    fn test_unresolvable_card_skips_side() {
        let mut ingestor = Ingestor::new();
        let mut battle = raw_battle(2, 0);
        battle.opponent.cards[3].id = None;

        let records = ingestor.ingest(&battle);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].side, Side::Team);
        assert_eq!(ingestor.stats().sides_skipped, 1);
    }

    #[test]
    fn test_duplicate_card_skips_side() {
        let mut ingestor = Ingestor::new();
        let mut battle = raw_battle(2, 0);
        battle.team.cards[0].id = Some(2); // Now two copies of id 2

        let records = ingestor.ingest(&battle);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].side, Side::Opponent);
    }

    #[test]
    fn test_card_order_does_not_change_fingerprint() {
        let mut ingestor = Ingestor::new();
        let battle = raw_battle(2, 0);

        let mut shuffled = raw_battle(2, 0);
        shuffled.battle_time = Some(Utc.with_ymd_and_hms(2025, 6, 12, 11, 0, 0).unwrap());
        shuffled.team.cards.reverse();

        let a = ingestor.ingest(&battle);
        let b = ingestor.ingest(&shuffled);

        assert_eq!(a[0].fingerprint, b[0].fingerprint);
        assert_eq!(a[0].card_ids, b[0].card_ids);
    }
}
