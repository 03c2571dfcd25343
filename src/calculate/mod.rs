//! Derived metrics computation.
//!
//! Turns the raw counter maps from a completed run into rate tables and the
//! two scalar meta-health scores (balance, diversity). All thresholds here
//! are policy values, not statistically derived; they are configurable and
//! should not be assumed to generalize across data samples.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateCounters;
use crate::models::{
    average_elixir, CardCatalog, CardClassification, CardStat, DeckStat, PairStat, TripleStat,
    DECK_SIZE,
};

/// Minimum-sample and classification thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum games before a card gets a meta score
    #[serde(default = "default_min_games_meta_score")]
    pub min_games_meta_score: u32,

    /// Minimum games before a card can be classified underrated
    #[serde(default = "default_min_games_underrated")]
    pub min_games_underrated: u32,

    /// Minimum games before a card can be classified overrated
    #[serde(default = "default_min_games_overrated")]
    pub min_games_overrated: u32,

    /// Minimum games for a pair to enter the synergy table
    #[serde(default = "default_min_games_pair")]
    pub min_games_pair: u32,

    /// Minimum games for a triple to enter the archetype-core table
    #[serde(default = "default_min_games_triple")]
    pub min_games_triple: u32,

    /// Usage-rate ceiling (percent) for the underrated label
    #[serde(default = "default_underrated_max_usage")]
    pub underrated_max_usage: f64,

    /// Win-rate floor (percent) for the underrated label
    #[serde(default = "default_underrated_min_win")]
    pub underrated_min_win: f64,

    /// Usage-rate floor (percent) for the overrated label
    #[serde(default = "default_overrated_min_usage")]
    pub overrated_min_usage: f64,

    /// Win-rate ceiling (percent) for the overrated label
    #[serde(default = "default_overrated_max_win")]
    pub overrated_max_win: f64,
}

fn default_min_games_meta_score() -> u32 {
    50
}

fn default_min_games_underrated() -> u32 {
    30
}

fn default_min_games_overrated() -> u32 {
    100
}

fn default_min_games_pair() -> u32 {
    50
}

fn default_min_games_triple() -> u32 {
    20
}

fn default_underrated_max_usage() -> f64 {
    1.0
}

fn default_underrated_min_win() -> f64 {
    52.0
}

fn default_overrated_min_usage() -> f64 {
    1.0
}

fn default_overrated_max_win() -> f64 {
    48.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_games_meta_score: default_min_games_meta_score(),
            min_games_underrated: default_min_games_underrated(),
            min_games_overrated: default_min_games_overrated(),
            min_games_pair: default_min_games_pair(),
            min_games_triple: default_min_games_triple(),
            underrated_max_usage: default_underrated_max_usage(),
            underrated_min_win: default_underrated_min_win(),
            overrated_min_usage: default_overrated_min_usage(),
            overrated_max_win: default_overrated_max_win(),
        }
    }
}

/// Card usage rate: share of all card-usage slots, percent. Each record
/// contributes exactly `DECK_SIZE` usage events, hence the `* 8` in the
/// denominator.
pub fn usage_rate(games: u32, total_records: u64) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    games as f64 / (total_records as f64 * DECK_SIZE as f64) * 100.0
}

/// Win rate in percent; 0 when no games were played rather than an error.
pub fn win_rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        return 0.0;
    }
    wins as f64 / games as f64 * 100.0
}

/// Pair co-occurrence rate across all records in scope, percent.
pub fn synergy_score(games: u32, total_records: u64) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    games as f64 / total_records as f64 * 100.0
}

/// Usage weighted by win-rate deviation from the 50% baseline.
pub fn meta_score(usage_rate: f64, win_rate: f64) -> f64 {
    usage_rate * (win_rate / 50.0)
}

/// Rank-based Gini coefficient over a usage-rate distribution, mapped to a
/// 0-100 balance score. 100 means perfectly even usage, 0 maximally
/// concentrated. Empty or all-zero input scores 0.
pub fn balance_score(usage_rates: &[f64]) -> f64 {
    let n = usage_rates.len();
    if n == 0 {
        return 0.0;
    }

    let mut sorted: Vec<f64> = usage_rates.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    // Gini = (n + 1 - 2 * sum(x_i * (n + 1 - i)) / sum(x)) / n with ranks
    // i = 1..n over the ascending-sorted values.
    let n_f = n as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(idx, x)| x * (n_f + 1.0 - (idx as f64 + 1.0)))
        .sum();
    let gini = (n_f + 1.0 - 2.0 * weighted / total) / n_f;

    ((1.0 - gini) * 100.0).clamp(0.0, 100.0)
}

/// Shannon diversity over deck game counts, normalized by `ln(deck count)`
/// and scaled to 0-100. Degenerate (fewer than two decks with games) is 0.
pub fn diversity_index(deck_games: &[u32]) -> f64 {
    let total: u64 = deck_games.iter().map(|&g| g as u64).sum();
    if total == 0 {
        return 0.0;
    }

    let proportions: Vec<f64> = deck_games
        .iter()
        .filter(|&&g| g > 0)
        .map(|&g| g as f64 / total as f64)
        .collect();

    if proportions.len() < 2 {
        return 0.0;
    }

    let entropy: f64 = proportions.iter().map(|p| -p * p.ln()).sum();
    let max_entropy = (proportions.len() as f64).ln();

    (entropy / max_entropy * 100.0).clamp(0.0, 100.0)
}

/// Classify a card as underrated/overrated per the fixed policy thresholds.
pub fn classify_card(
    usage: f64,
    win: f64,
    games: u32,
    thresholds: &Thresholds,
) -> Option<CardClassification> {
    if games >= thresholds.min_games_underrated
        && usage < thresholds.underrated_max_usage
        && win > thresholds.underrated_min_win
    {
        return Some(CardClassification::Underrated);
    }
    if games >= thresholds.min_games_overrated
        && usage > thresholds.overrated_min_usage
        && win < thresholds.overrated_max_win
    {
        return Some(CardClassification::Overrated);
    }
    None
}

/// All derived tables and scores for one completed run.
#[derive(Debug, Clone, Default)]
pub struct DerivedMetrics {
    pub cards: Vec<CardStat>,
    pub decks: Vec<DeckStat>,
    pub pairs: Vec<PairStat>,
    pub triples: Vec<TripleStat>,
    pub balance_score: f64,
    pub diversity_index: f64,
    pub top_deck_dominance: f64,
}

/// Compute every derived table and score from the final counters.
///
/// Unknown card ids stay in the card table (unnamed) but do not
/// participate in the balance score or classification; pair and triple
/// tables are gated by their minimum sample thresholds.
pub fn derive(
    counters: &AggregateCounters,
    catalog: &CardCatalog,
    thresholds: &Thresholds,
) -> DerivedMetrics {
    let n = counters.total_records;

    let mut cards: Vec<CardStat> = counters
        .cards
        .iter()
        .map(|(&id, counter)| {
            let usage = usage_rate(counter.games, n);
            let win = win_rate(counter.wins, counter.games);
            let known = catalog.contains(id);

            let score = (known && counter.games >= thresholds.min_games_meta_score)
                .then(|| meta_score(usage, win));
            let classification = known
                .then(|| classify_card(usage, win, counter.games, thresholds))
                .flatten();

            CardStat {
                card_id: id,
                name: catalog.get(id).map(|c| c.name.clone()),
                rarity: catalog.get(id).map(|c| c.rarity),
                games: counter.games,
                wins: counter.wins,
                usage_rate: usage,
                win_rate: win,
                meta_score: score,
                classification,
            }
        })
        .collect();
    cards.sort_by(|a, b| {
        b.usage_rate
            .total_cmp(&a.usage_rate)
            .then(a.card_id.cmp(&b.card_id))
    });

    let mut decks: Vec<DeckStat> = counters
        .decks
        .iter()
        .map(|(fp, deck)| DeckStat {
            fingerprint: fp.clone(),
            card_ids: deck.card_ids.to_vec(),
            avg_elixir: average_elixir(&deck.card_ids, catalog),
            games: deck.games,
            wins: deck.wins,
            win_rate: win_rate(deck.wins, deck.games),
            usage_rate: if n == 0 {
                0.0
            } else {
                deck.games as f64 / n as f64 * 100.0
            },
        })
        .collect();
    decks.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then_with(|| a.fingerprint.as_str().cmp(b.fingerprint.as_str()))
    });

    let mut pairs: Vec<PairStat> = counters
        .pairs
        .iter()
        .filter(|(_, c)| c.games >= thresholds.min_games_pair)
        .map(|(&(a, b), counter)| PairStat {
            card_ids: [a, b],
            games: counter.games,
            wins: counter.wins,
            win_rate: win_rate(counter.wins, counter.games),
            synergy_score: synergy_score(counter.games, n),
        })
        .collect();
    pairs.sort_by(|a, b| b.games.cmp(&a.games).then(a.card_ids.cmp(&b.card_ids)));

    let mut triples: Vec<TripleStat> = counters
        .triples
        .iter()
        .filter(|(_, c)| c.games >= thresholds.min_games_triple)
        .map(|(&(a, b, c), counter)| TripleStat {
            card_ids: [a, b, c],
            games: counter.games,
            wins: counter.wins,
            win_rate: win_rate(counter.wins, counter.games),
        })
        .collect();
    triples.sort_by(|a, b| b.games.cmp(&a.games).then(a.card_ids.cmp(&b.card_ids)));

    let resolved_usage: Vec<f64> = cards
        .iter()
        .filter(|c| c.name.is_some() && c.games > 0)
        .map(|c| c.usage_rate)
        .collect();
    let deck_games: Vec<u32> = decks.iter().map(|d| d.games).collect();
    let top_deck_dominance = decks.iter().take(10).map(|d| d.usage_rate).sum();

    DerivedMetrics {
        balance_score: balance_score(&resolved_usage),
        diversity_index: diversity_index(&deck_games),
        top_deck_dominance,
        cards,
        decks,
        pairs,
        triples,
    }
}
