use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// Item kind carried across the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Drink,
    Food,
    Parcel,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Drink, Category::Food, Category::Parcel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Drink => "Drink",
            Category::Food => "Food",
            Category::Parcel => "Parcel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TrackError;

    /// Labels are matched exactly; anything else is rejected rather than coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Drink" => Ok(Category::Drink),
            "Food" => Ok(Category::Food),
            "Parcel" => Ok(Category::Parcel),
            other => Err(TrackError::InvalidCategory(other.to_string())),
        }
    }
}

/// One non-negative counter per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub drinks: u64,
    pub food: u64,
    pub parcels: u64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Drink => self.drinks,
            Category::Food => self.food,
            Category::Parcel => self.parcels,
        }
    }

    fn slot(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Drink => &mut self.drinks,
            Category::Food => &mut self.food,
            Category::Parcel => &mut self.parcels,
        }
    }

    pub fn increment(&mut self, category: Category) {
        *self.slot(category) += 1;
    }

    /// Decrement clamped at zero.
    pub fn saturating_decrement(&mut self, category: Category) {
        let slot = self.slot(category);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u64 {
        self.drinks + self.food + self.parcels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_labels() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_miscased() {
        assert!(matches!(
            "Cutlery".parse::<Category>(),
            Err(TrackError::InvalidCategory(label)) if label == "Cutlery"
        ));
        assert!("food".parse::<Category>().is_err());
    }

    #[test]
    fn test_counts_never_underflow() {
        let mut counts = CategoryCounts::default();
        counts.saturating_decrement(Category::Parcel);
        assert_eq!(counts.parcels, 0);

        counts.increment(Category::Parcel);
        counts.increment(Category::Food);
        counts.saturating_decrement(Category::Parcel);
        counts.saturating_decrement(Category::Parcel);
        assert_eq!(counts.get(Category::Parcel), 0);
        assert_eq!(counts.total(), 1);
    }
}
