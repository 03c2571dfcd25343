//! Card reference data and the per-run catalog lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Card rarity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Epic => write!(f, "epic"),
            Rarity::Legendary => write!(f, "legendary"),
            Rarity::Champion => write!(f, "champion"),
        }
    }
}

/// Broad card categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Troop,
    Spell,
    Building,
}

/// Immutable card reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Game-assigned card id
    pub id: u32,

    /// Unique display name
    pub name: String,

    pub rarity: Rarity,

    /// Elixir cost (1-9)
    pub elixir: u8,

    #[serde(rename = "type")]
    pub card_type: CardType,
}

/// Read-only card lookup for one aggregation run.
///
/// Built once from externally supplied reference data and passed explicitly;
/// unknown ids resolve to `None` rather than erroring.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<u32, Card>,
}

impl CardCatalog {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.cards.contains_key(&id)
    }

    /// Display name for a card id, falling back to a placeholder for
    /// ids absent from the catalog.
    pub fn name_of(&self, id: u32) -> String {
        match self.cards.get(&id) {
            Some(card) => card.name.clone(),
            None => format!("Card {}", id),
        }
    }

    /// Elixir cost for a card id; unknown cards contribute 0.
    pub fn elixir_of(&self, id: u32) -> u8 {
        self.cards.get(&id).map(|c| c.elixir).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }
}
