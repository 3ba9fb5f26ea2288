//! Built-in demo catalogs

use crate::prize::{Prize, Rarity};

/// Demo catalogs for self-contained play and testing
pub struct DemoCatalog;

impl DemoCatalog {
    /// Standard eight-prize box, weights sum to 100
    pub fn standard() -> Vec<Prize> {
        vec![
            Prize::new("sticker", "Sticker Pack", Rarity::Common, 30.0).with_value(1.0),
            Prize::new("keychain", "Keychain", Rarity::Common, 22.0).with_value(2.5),
            Prize::new("mug", "Logo Mug", Rarity::Common, 18.0).with_value(6.0),
            Prize::new("hoodie", "Hoodie", Rarity::Rare, 12.0).with_value(35.0),
            Prize::new("headphones", "Headphones", Rarity::Rare, 9.0).with_value(60.0),
            Prize::new("console", "Game Console", Rarity::Epic, 5.5).with_value(300.0),
            Prize::new("laptop", "Laptop", Rarity::Epic, 3.0).with_value(900.0),
            Prize::new("gold-bar", "Gold Bar", Rarity::Legendary, 0.5).with_value(5000.0),
        ]
    }

    /// Three-prize catalog with 70/20/10 weights
    pub fn simple() -> Vec<Prize> {
        vec![
            Prize::new("a", "Common Prize", Rarity::Common, 70.0).with_value(1.0),
            Prize::new("b", "Rare Prize", Rarity::Rare, 20.0).with_value(10.0),
            Prize::new("c", "Legendary Prize", Rarity::Legendary, 10.0).with_value(100.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = DemoCatalog::standard();
        let total: f64 = catalog.iter().map(|p| p.weight).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(catalog.iter().any(|p| p.rarity.is_top_tier()));

        let mut ids: Vec<_> = catalog.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
