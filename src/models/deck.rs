//! Order-independent deck identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use super::CardCatalog;

/// Number of cards in a valid deck.
pub const DECK_SIZE: usize = 8;

/// Errors producing a deck fingerprint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck must have exactly {DECK_SIZE} cards, got {0}")]
    InvalidDeckSize(usize),

    #[error("deck contains duplicate card id {0}")]
    DuplicateCard(u32),
}

/// Canonical fingerprint of an unordered 8-card set.
///
/// Any permutation of the same card ids hashes to the same fingerprint;
/// fingerprints are persisted as primary keys, so collision resistance
/// matters more than hash speed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckFingerprint(String);

impl DeckFingerprint {
    /// Fingerprint an 8-card deck: sort ids ascending, join with `,`,
    /// SHA256, hex digest.
    pub fn from_cards(card_ids: &[u32]) -> Result<Self, DeckError> {
        let sorted = sorted_deck(card_ids)?;
        let joined = sorted
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DeckFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeckFingerprint({}...)", &self.0[..8.min(self.0.len())])
    }
}

impl From<&str> for DeckFingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Validate and canonicalize a deck's card ids: exactly 8 distinct ids,
/// returned in ascending order.
pub fn sorted_deck(card_ids: &[u32]) -> Result<[u32; DECK_SIZE], DeckError> {
    if card_ids.len() != DECK_SIZE {
        return Err(DeckError::InvalidDeckSize(card_ids.len()));
    }

    let mut sorted = [0u32; DECK_SIZE];
    sorted.copy_from_slice(card_ids);
    sorted.sort_unstable();

    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(DeckError::DuplicateCard(pair[0]));
        }
    }

    Ok(sorted)
}

/// Average elixir cost of a deck, derived from the catalog.
/// Cards missing from the catalog contribute 0.
pub fn average_elixir(card_ids: &[u32], catalog: &CardCatalog) -> f64 {
    if card_ids.is_empty() {
        return 0.0;
    }
    let total: u32 = card_ids.iter().map(|&id| catalog.elixir_of(id) as u32).sum();
    total as f64 / card_ids.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, CardType, Rarity};

    const DECK: [u32; 8] = [26000000, 26000001, 26000010, 27000004, 28000000, 28000001, 26000030, 26000049];

    #[test]
    fn test_fingerprint_order_independent() {
        let forward = DeckFingerprint::from_cards(&DECK).unwrap();

        let mut reversed = DECK;
        reversed.reverse();
        let backward = DeckFingerprint::from_cards(&reversed).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_fingerprint_all_permutations_of_small_ids() {
        // Exhaustive permutation checking is factorial; rotate instead.
        let base: Vec<u32> = (1..=8).collect();
        let expected = DeckFingerprint::from_cards(&base).unwrap();

        for rot in 1..8 {
            let mut rotated = base.clone();
            rotated.rotate_left(rot);
            assert_eq!(DeckFingerprint::from_cards(&rotated).unwrap(), expected);
        }
    }

    #[test]
    fn test_fingerprint_distinct_sets() {
        let a = DeckFingerprint::from_cards(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let b = DeckFingerprint::from_cards(&[1, 2, 3, 4, 5, 6, 7, 9]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_sample_no_collisions() {
        use std::collections::HashSet;

        // Probabilistic check over a large sample of distinct 8-card sets.
        let mut fingerprints = HashSet::new();
        let mut decks = 0;
        for offset in 0u32..1000 {
            let deck: Vec<u32> = (0..8).map(|i| offset + i * 1000).collect();
            let fp = DeckFingerprint::from_cards(&deck).unwrap();
            fingerprints.insert(fp);
            decks += 1;
        }
        assert_eq!(fingerprints.len(), decks);
    }

    #[test]
    fn test_fingerprint_wrong_size() {
        assert_eq!(
            DeckFingerprint::from_cards(&[1, 2, 3]),
            Err(DeckError::InvalidDeckSize(3))
        );
        assert_eq!(
            DeckFingerprint::from_cards(&[1, 2, 3, 4, 5, 6, 7, 8, 9]),
            Err(DeckError::InvalidDeckSize(9))
        );
    }

    #[test]
    fn test_fingerprint_duplicate_card() {
        assert_eq!(
            DeckFingerprint::from_cards(&[1, 2, 3, 4, 5, 6, 7, 7]),
            Err(DeckError::DuplicateCard(7))
        );
    }

    #[test]
    fn test_fingerprint_hex_digest() {
        let fp = DeckFingerprint::from_cards(&DECK).unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_average_elixir() {
        let cards = vec![
            Card {
                id: 1,
                name: "Cheap".to_string(),
                rarity: Rarity::Common,
                elixir: 2,
                card_type: CardType::Troop,
            },
            Card {
                id: 2,
                name: "Heavy".to_string(),
                rarity: Rarity::Epic,
                elixir: 6,
                card_type: CardType::Troop,
            },
        ];
        let catalog = CardCatalog::new(cards);

        assert!((average_elixir(&[1, 2], &catalog) - 4.0).abs() < f64::EPSILON);
        // Unknown id 3 contributes 0 elixir
        assert!((average_elixir(&[1, 2, 3], &catalog) - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(average_elixir(&[], &catalog), 0.0);
    }
}
