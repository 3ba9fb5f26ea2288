//! Prize definitions and rarity tiers

use serde::{Deserialize, Serialize};

/// Rarity tier, ordered from least to most desirable
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rarity {
    #[default]
    Common = 0,
    Rare = 1,
    Epic = 2,
    Legendary = 3,
}

impl Rarity {
    /// Highest tier
    pub const TOP: Rarity = Rarity::Legendary;

    /// Convert from u8 index (out of range → Common)
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Rarity::Rare,
            2 => Rarity::Epic,
            3 => Rarity::Legendary,
            _ => Rarity::Common,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    pub fn is_top_tier(&self) -> bool {
        *self == Self::TOP
    }

    pub fn all() -> &'static [Rarity] {
        &[
            Rarity::Common,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
        ]
    }
}

/// A prize in the catalog
///
/// Copied by value into reveal strips; the catalog owns the canonical list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    /// Unique prize ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Image reference (URL or asset key)
    #[serde(default)]
    pub image: String,
    /// Rarity tier
    #[serde(default)]
    pub rarity: Rarity,
    /// Monetary value
    #[serde(default)]
    pub value: f64,
    /// Raw odds weight (unit-less, expected non-negative)
    pub weight: f64,
}

impl Prize {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rarity: Rarity, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            rarity,
            value: 0.0,
            weight,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Weight as used by the normalizer: negative and non-finite weights count as zero
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }

    /// Can this prize ever be drawn?
    pub fn is_drawable(&self) -> bool {
        self.effective_weight() > 0.0
    }
}
