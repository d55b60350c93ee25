//! Keyword/type heuristics deciding which provider categories fit an entity.
//!
//! Pure and deterministic: no I/O, no model calls.

use std::collections::BTreeSet;
use std::fmt;

use screenlens_shared::{Entity, EntityType};

/// A family of providers worth querying for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    MovieTv,
    Book,
    Music,
    Perfume,
    Electronics,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MovieTv => "movie-tv",
            Self::Book => "book",
            Self::Music => "music",
            Self::Perfume => "perfume",
            Self::Electronics => "electronics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BOOK_HINTS: &[&str] = &["book", "author", "isbn"];
const MUSIC_HINTS: &[&str] = &["song", "album", "single", "track", "artist"];
const PERFUME_HINTS: &[&str] = &[
    "perfume",
    "parfum",
    "eau de parfum",
    "edp",
    "edt",
    "cologne",
    "fragrance",
];
const ELECTRONICS_HINTS: &[&str] = &[
    "gb ram",
    "mp camera",
    "inch",
    "hz",
    "snapdragon",
    "apple m",
    "usb-c",
    "android",
    "ios",
];

/// Categories plausible for `entity`, given the joined summary bullets.
///
/// Hints are plain lowercase substring matches against the entity's own
/// fields (which fields depends on the category) and the summary.
pub fn classify(entity: &Entity, summary_text: &str) -> BTreeSet<Category> {
    let summary = summary_text.to_lowercase();
    let name = entity.name.to_lowercase();
    let with_brand = join_lower(&entity.name, entity.brand.as_deref());
    let with_model = join_lower(&entity.name, entity.model.as_deref());

    let hinted = |field: &str, hints: &[&str]| {
        hints
            .iter()
            .any(|h| field.contains(h) || summary.contains(h))
    };

    let mut categories = BTreeSet::new();

    if matches!(entity.kind, EntityType::Movie | EntityType::Tv) {
        categories.insert(Category::MovieTv);
    }
    if entity.kind == EntityType::Book || hinted(&name, BOOK_HINTS) {
        categories.insert(Category::Book);
    }
    if entity.kind == EntityType::Music || hinted(&name, MUSIC_HINTS) {
        categories.insert(Category::Music);
    }
    if entity.kind == EntityType::ProductPerfume || hinted(&with_brand, PERFUME_HINTS) {
        categories.insert(Category::Perfume);
    }
    if entity.kind == EntityType::ProductElectronics || hinted(&with_model, ELECTRONICS_HINTS) {
        categories.insert(Category::Electronics);
    }

    categories
}

fn join_lower(name: &str, extra: Option<&str>) -> String {
    format!("{} {}", name, extra.unwrap_or_default()).to_lowercase()
}
