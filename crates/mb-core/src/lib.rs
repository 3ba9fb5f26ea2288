//! mb-core: Prize catalog data model
//!
//! Shared types for every mystery box crate:
//! - `Prize` and its ordered `Rarity` tier
//! - `CatalogRecord`, the import/export schema used for catalog backups
//! - Built-in demo catalogs

mod presets;
mod prize;
mod record;

pub use presets::*;
pub use prize::*;
pub use record::*;
