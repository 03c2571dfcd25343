//! Aggregation scopes: trophy brackets and game-mode categories.

use serde::{Deserialize, Serialize};

use super::OutcomeRecord;

/// A trophy bracket, half-open: `min <= trophies < max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrophyRange {
    All,
    Bracket { min: u32, max: Option<u32> },
}

/// Standard ladder brackets used for snapshot labels.
pub const TROPHY_BRACKETS: [(&str, u32, Option<u32>); 5] = [
    ("0-5000", 0, Some(5000)),
    ("5000-6000", 5000, Some(6000)),
    ("6000-7000", 6000, Some(7000)),
    ("7000-8000", 7000, Some(8000)),
    ("8000+", 8000, None),
];

impl TrophyRange {
    /// Parse a bracket label like "5000-6000", "8000+" or "all".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if s.eq_ignore_ascii_case("all") {
            return Some(TrophyRange::All);
        }

        if let Some(min) = s.strip_suffix('+') {
            let min: u32 = min.parse().ok()?;
            return Some(TrophyRange::Bracket { min, max: None });
        }

        let (min, max) = s.split_once('-')?;
        let min: u32 = min.parse().ok()?;
        let max: u32 = max.parse().ok()?;
        if max <= min {
            return None;
        }
        Some(TrophyRange::Bracket {
            min,
            max: Some(max),
        })
    }

    /// Whether a record's trophy count falls in this range. Records without
    /// trophy data only match the unrestricted range.
    pub fn contains(&self, trophies: Option<u32>) -> bool {
        match self {
            TrophyRange::All => true,
            TrophyRange::Bracket { min, max } => match trophies {
                Some(t) => t >= *min && max.map_or(true, |m| t < m),
                None => false,
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            TrophyRange::All => "all".to_string(),
            TrophyRange::Bracket { min, max: Some(max) } => format!("{}-{}", min, max),
            TrophyRange::Bracket { min, max: None } => format!("{}+", min),
        }
    }
}

/// Game-mode groupings over the raw mode strings the API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameModeCategory {
    All,
    Ladder,
    Challenge,
    Tournament,
    War,
}

impl GameModeCategory {
    /// Parse a category name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(GameModeCategory::All),
            "ladder" => Some(GameModeCategory::Ladder),
            "challenge" => Some(GameModeCategory::Challenge),
            "tournament" => Some(GameModeCategory::Tournament),
            "war" => Some(GameModeCategory::War),
            _ => None,
        }
    }

    /// Classify a raw game-mode string from a battle log.
    pub fn categorize(mode: &str) -> Option<Self> {
        match mode {
            "PvP" | "pathOfLegend" | "ranked1v1" => Some(GameModeCategory::Ladder),
            "challenge" | "grandChallenge" | "classicChallenge" => Some(GameModeCategory::Challenge),
            "tournament" => Some(GameModeCategory::Tournament),
            "riverRacePvP" | "riverRaceDuel" | "clanWarWarDay" | "boatBattle" => {
                Some(GameModeCategory::War)
            }
            _ => None,
        }
    }

    /// Whether a record's raw mode string belongs to this category. Records
    /// without a mode only match the unrestricted category.
    pub fn matches(&self, mode: Option<&str>) -> bool {
        match self {
            GameModeCategory::All => true,
            cat => mode.and_then(Self::categorize).is_some_and(|c| c == *cat),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameModeCategory::All => "all",
            GameModeCategory::Ladder => "ladder",
            GameModeCategory::Challenge => "challenge",
            GameModeCategory::Tournament => "tournament",
            GameModeCategory::War => "war",
        }
    }
}

/// The scope of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub trophy_range: TrophyRange,
    pub game_mode: GameModeCategory,
}

impl Scope {
    pub fn all() -> Self {
        Self {
            trophy_range: TrophyRange::All,
            game_mode: GameModeCategory::All,
        }
    }

    pub fn new(trophy_range: TrophyRange, game_mode: GameModeCategory) -> Self {
        Self {
            trophy_range,
            game_mode,
        }
    }

    /// Whether an outcome record belongs to this scope.
    pub fn matches(&self, record: &OutcomeRecord) -> bool {
        self.trophy_range.contains(record.trophies)
            && self.game_mode.matches(record.game_mode.as_deref())
    }

    /// Stable label used for snapshot rows, e.g. "6000-7000/ladder".
    pub fn label(&self) -> String {
        format!("{}/{}", self.trophy_range.label(), self.game_mode.label())
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::all()
    }
}
