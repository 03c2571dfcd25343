//! Append-only snapshot store.

use chrono::Utc;
use tracing::info;

use crate::aggregate::AggregateCounters;
use crate::calculate::DerivedMetrics;
use crate::models::{MetaSnapshot, SnapshotId};

use super::{JsonlReader, JsonlWriter, StorageConfig, StorageError};

/// Persists completed aggregation runs as immutable snapshots.
///
/// Every run appends a brand-new row, even when run with identical
/// parameters, so historical snapshots can be compared; nothing here ever
/// updates or deletes an existing snapshot.
pub struct SnapshotStore {
    config: StorageConfig,
}

impl SnapshotStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Build a snapshot from a completed run and persist it.
    pub fn create(
        &self,
        scope_label: &str,
        snapshot_type: Option<&str>,
        counters: &AggregateCounters,
        metrics: DerivedMetrics,
    ) -> Result<MetaSnapshot, StorageError> {
        let taken_at = Utc::now();
        let id = SnapshotId::generate(&[
            scope_label,
            snapshot_type.unwrap_or_default(),
            &taken_at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        ]);

        let snapshot = MetaSnapshot {
            id,
            scope: scope_label.to_string(),
            snapshot_type: snapshot_type.map(|s| s.to_string()),
            taken_at,
            sample_size: counters.total_records,
            total_decks: counters.decks.len() as u64,
            cards: metrics.cards,
            decks: metrics.decks,
            pairs: metrics.pairs,
            triples: metrics.triples,
            balance_score: metrics.balance_score,
            diversity_index: metrics.diversity_index,
            top_deck_dominance: metrics.top_deck_dominance,
        };

        let writer = JsonlWriter::new(self.config.snapshots_file());
        writer.append(&snapshot)?;

        info!(
            id = %snapshot.id,
            scope = %snapshot.scope,
            sample_size = snapshot.sample_size,
            total_decks = snapshot.total_decks,
            "created meta snapshot"
        );

        Ok(snapshot)
    }

    /// All snapshots, oldest first (append order).
    pub fn list(&self) -> Result<Vec<MetaSnapshot>, StorageError> {
        let reader = JsonlReader::new(self.config.snapshots_file());
        reader.read_all()
    }

    /// Snapshots with a given scope label, oldest first.
    pub fn by_scope(&self, scope_label: &str) -> Result<Vec<MetaSnapshot>, StorageError> {
        let reader = JsonlReader::<MetaSnapshot>::new(self.config.snapshots_file());
        reader.read_where(|s| s.scope == scope_label)
    }

    /// The most recent snapshot for a scope label, if any.
    pub fn latest(&self, scope_label: &str) -> Result<Option<MetaSnapshot>, StorageError> {
        let mut matching = self.by_scope(scope_label)?;
        matching.sort_by_key(|s| s.taken_at);
        Ok(matching.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::calculate::{derive, Thresholds};
    use crate::models::{
        BattleId, CardCatalog, DeckFingerprint, OutcomeRecord, Scope, Side,
    };
    use tempfile::TempDir;

    fn run_counters(won: bool) -> AggregateCounters {
        let ids = [1, 2, 3, 4, 5, 6, 7, 8];
        let record = OutcomeRecord {
            battle_id: BattleId::from("b"),
            side: Side::Team,
            fingerprint: DeckFingerprint::from_cards(&ids).unwrap(),
            card_ids: ids,
            opponent_fingerprint: None,
            won,
            trophies: None,
            game_mode: None,
            battle_time: None,
        };

        let mut agg = Aggregator::new(Scope::all());
        agg.observe(&record);
        agg.finish()
    }

    fn store(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(StorageConfig::new(dir.path().to_path_buf()))
    }

    #[test]
    fn test_create_and_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let counters = run_counters(true);
        let metrics = derive(&counters, &CardCatalog::default(), &Thresholds::default());

        let snapshot = store
            .create("all/all", Some("test"), &counters, metrics)
            .unwrap();

        assert_eq!(snapshot.sample_size, 1);
        assert_eq!(snapshot.total_decks, 1);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, snapshot.id);
    }

    #[test]
    fn test_identical_runs_append_new_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let counters = run_counters(true);

        for _ in 0..3 {
            let metrics = derive(&counters, &CardCatalog::default(), &Thresholds::default());
            store.create("all/all", None, &counters, metrics).unwrap();
        }

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 3);
        // Every run gets its own identity
        assert_ne!(listed[0].id, listed[1].id);
        assert_ne!(listed[1].id, listed[2].id);
    }

    #[test]
    fn test_by_scope_and_latest() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let counters = run_counters(true);

        let metrics = derive(&counters, &CardCatalog::default(), &Thresholds::default());
        store
            .create("6000-7000/ladder", None, &counters, metrics)
            .unwrap();
        let metrics = derive(&counters, &CardCatalog::default(), &Thresholds::default());
        let second = store
            .create("6000-7000/ladder", None, &counters, metrics)
            .unwrap();
        let metrics = derive(&counters, &CardCatalog::default(), &Thresholds::default());
        store.create("all/all", None, &counters, metrics).unwrap();

        assert_eq!(store.by_scope("6000-7000/ladder").unwrap().len(), 2);
        assert_eq!(store.by_scope("all/all").unwrap().len(), 1);
        assert!(store.by_scope("8000+/war").unwrap().is_empty());

        let latest = store.latest("6000-7000/ladder").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert!(store.latest("8000+/war").unwrap().is_none());
    }
}
