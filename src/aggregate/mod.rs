//! Counter accumulation over a stream of outcome records.
//!
//! One `Aggregator` owns its counter maps for the duration of a single run;
//! when the run completes the numbers move into a snapshot and the counters
//! are discarded. Combination keys (pairs, triples) are always tuples of
//! ascending card ids, so results are reproducible regardless of the input
//! card ordering.

use std::collections::HashMap;

use tracing::warn;

use crate::models::{DeckFingerprint, OutcomeRecord, Scope, DECK_SIZE};

/// Games/wins tally for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub games: u32,
    pub wins: u32,
}

impl Counter {
    fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    fn merge(&mut self, other: &Counter) {
        self.games += other.games;
        self.wins += other.wins;
    }
}

/// Games/wins tally for one deck, keeping the member cards for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckCounter {
    pub card_ids: [u32; DECK_SIZE],
    pub games: u32,
    pub wins: u32,
}

/// Final counter maps for one completed run.
#[derive(Debug, Clone, Default)]
pub struct AggregateCounters {
    pub cards: HashMap<u32, Counter>,
    pub pairs: HashMap<(u32, u32), Counter>,
    pub triples: HashMap<(u32, u32, u32), Counter>,
    pub decks: HashMap<DeckFingerprint, DeckCounter>,

    /// Total outcome records observed in scope
    pub total_records: u64,
}

impl AggregateCounters {
    /// Merge another shard into this one. Counter addition is associative
    /// and commutative, so sharded ingestion merged at the end matches a
    /// single sequential pass.
    pub fn merge(&mut self, other: AggregateCounters) {
        for (id, counter) in other.cards {
            self.cards.entry(id).or_default().merge(&counter);
        }
        for (pair, counter) in other.pairs {
            self.pairs.entry(pair).or_default().merge(&counter);
        }
        for (triple, counter) in other.triples {
            self.triples.entry(triple).or_default().merge(&counter);
        }
        for (fp, deck) in other.decks {
            let entry = self.decks.entry(fp).or_insert_with(|| DeckCounter {
                card_ids: deck.card_ids,
                ..Default::default()
            });
            entry.games += deck.games;
            entry.wins += deck.wins;
        }
        self.total_records += other.total_records;
    }
}

/// Accumulates per-card, per-pair, per-triple and per-deck counters for a
/// single scope.
#[derive(Debug)]
pub struct Aggregator {
    scope: Scope,
    counters: AggregateCounters,
    out_of_scope: u64,
    rejected: u64,
}

impl Aggregator {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            counters: AggregateCounters::default(),
            out_of_scope: 0,
            rejected: 0,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Observe one outcome record. Returns true if it was counted.
    ///
    /// Records outside the scope are ignored; malformed records (duplicate
    /// card ids) are rejected rather than crashing the run. Upstream dedup
    /// guarantees no record arrives twice.
    pub fn observe(&mut self, record: &OutcomeRecord) -> bool {
        if !self.scope.matches(record) {
            self.out_of_scope += 1;
            return false;
        }

        // Canonicalize defensively: ingestion already sorts, but the
        // aggregator must not trust its input ordering.
        let mut ids = record.card_ids;
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            warn!(battle_id = %record.battle_id, "rejected record with duplicate card ids");
            self.rejected += 1;
            return false;
        }

        let won = record.won;

        for &id in &ids {
            self.counters.cards.entry(id).or_default().record(won);
        }

        // C(8,2) = 28 unordered pairs
        for i in 0..DECK_SIZE {
            for j in (i + 1)..DECK_SIZE {
                self.counters
                    .pairs
                    .entry((ids[i], ids[j]))
                    .or_default()
                    .record(won);
            }
        }

        // C(8,3) = 56 unordered triples
        for i in 0..DECK_SIZE {
            for j in (i + 1)..DECK_SIZE {
                for k in (j + 1)..DECK_SIZE {
                    self.counters
                        .triples
                        .entry((ids[i], ids[j], ids[k]))
                        .or_default()
                        .record(won);
                }
            }
        }

        let deck = self
            .counters
            .decks
            .entry(record.fingerprint.clone())
            .or_insert_with(|| DeckCounter {
                card_ids: ids,
                ..Default::default()
            });
        deck.games += 1;
        if won {
            deck.wins += 1;
        }

        self.counters.total_records += 1;
        true
    }

    /// Observe a sequence of records.
    pub fn observe_all<'a>(&mut self, records: impl IntoIterator<Item = &'a OutcomeRecord>) {
        for record in records {
            self.observe(record);
        }
    }

    pub fn total_records(&self) -> u64 {
        self.counters.total_records
    }

    pub fn out_of_scope(&self) -> u64 {
        self.out_of_scope
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Complete the run, transferring ownership of the counters.
    pub fn finish(self) -> AggregateCounters {
        self.counters
    }
}
