//! Menu Data Model

use serde::{Deserialize, Serialize};

/// Menu course a special belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Course {
    Soup,
    Salad,
    Drink,
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soup => write!(f, "Soup"),
            Self::Salad => write!(f, "Salad"),
            Self::Drink => write!(f, "Drink"),
        }
    }
}

/// One of the day's specials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Special {
    pub course: Course,
    pub item: String,
}

impl Special {
    pub fn new(course: Course, item: impl Into<String>) -> Self {
        Self {
            course,
            item: item.into(),
        }
    }
}

/// The restaurant menu.
///
/// Every item is sold at one flat price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Menu {
    specials: Vec<Special>,
    flat_price: String,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new(
            vec![
                Special::new(Course::Soup, "Clam Chowder"),
                Special::new(Course::Salad, "Cobb Salad"),
                Special::new(Course::Drink, "Chai Tea"),
            ],
            "$9.99",
        )
    }
}

impl Menu {
    pub fn new(specials: Vec<Special>, flat_price: impl Into<String>) -> Self {
        Self {
            specials,
            flat_price: flat_price.into(),
        }
    }

    /// Specials rendered one per line
    pub fn specials_text(&self) -> String {
        self.specials
            .iter()
            .map(|s| format!("Special {}: {}", s.course, s.item))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Price of a menu item
    pub fn price_of(&self, _item: &str) -> &str {
        &self.flat_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_specials_text() {
        assert_eq!(
            Menu::default().specials_text(),
            "Special Soup: Clam Chowder\nSpecial Salad: Cobb Salad\nSpecial Drink: Chai Tea"
        );
    }

    #[test]
    fn test_flat_price() {
        let menu = Menu::default();
        assert_eq!(menu.price_of("Soup"), "$9.99");
        assert_eq!(menu.price_of("anything at all"), "$9.99");
    }
}
