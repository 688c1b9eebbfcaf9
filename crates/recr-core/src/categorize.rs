//! Item categorization.
//!
//! The pipeline assigns a spending category to every extracted item through
//! the narrow [`Categorizer`] interface, so callers can plug in their own
//! classifier. [`KeywordCategorizer`] is the built-in default.

use crate::models::receipt::Category;

/// Assigns a spending category to an item name.
pub trait Categorizer {
    fn categorize(&self, name: &str) -> Category;
}

/// Any pure function over the item name is a valid categorizer.
impl<F> Categorizer for F
where
    F: Fn(&str) -> Category,
{
    fn categorize(&self, name: &str) -> Category {
        self(name)
    }
}

const GROCERY_KEYWORDS: &[&str] = &[
    "milk", "bread", "eggs", "cheese", "butter", "yogurt", "flour", "sugar", "rice", "pasta",
    "cereal", "fruit", "vegetable", "meat", "chicken", "beef", "pork", "fish", "salmon", "tuna",
    "apple", "banana", "orange", "tomato", "lettuce", "carrot", "potato", "onion", "garlic",
    "oil", "salt", "pepper",
];

const RESTAURANT_KEYWORDS: &[&str] = &[
    "burger", "fries", "pizza", "sandwich", "taco", "burrito", "salad", "sundae", "ice cream",
    "shake", "soda", "coffee", "tea", "latte", "cappuccino", "espresso", "mocha", "combo",
    "meal", "nuggets", "wings", "wrap", "sub", "hot dog", "nachos", "quesadilla", "smoothie",
    "juice", "caramel", "fudge", "chocolate", "vanilla", "strawberry",
];

const PHARMACY_KEYWORDS: &[&str] = &[
    "medicine", "prescription", "tablet", "capsule", "syrup", "ointment", "bandage", "vitamin",
    "supplement", "aspirin", "ibuprofen", "antibiotic", "inhaler", "drops", "lotion",
    "sunscreen", "sanitizer", "thermometer",
];

const RETAIL_KEYWORDS: &[&str] = &[
    "shirt", "pants", "shoes", "socks", "jacket", "dress", "hat", "bag", "wallet", "belt",
    "watch", "glasses", "towel", "pillow", "blanket", "lamp", "candle", "book", "toy", "game",
    "electronics", "phone", "charger", "cable", "battery", "pen", "paper", "notebook", "folder",
];

/// Keyword-table categorizer.
///
/// Matches the lowercased item name against per-category keyword lists;
/// grocery terms win over restaurant terms when both appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCategorizer;

impl KeywordCategorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, name: &str) -> Category {
        let name = name.to_lowercase();
        let tables = [
            (Category::Groceries, GROCERY_KEYWORDS),
            (Category::Restaurant, RESTAURANT_KEYWORDS),
            (Category::Pharmacy, PHARMACY_KEYWORDS),
            (Category::Retail, RETAIL_KEYWORDS),
        ];

        for (category, keywords) in tables {
            if keywords.iter().any(|k| name.contains(k)) {
                return category;
            }
        }

        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_categories() {
        let categorizer = KeywordCategorizer::new();
        assert_eq!(categorizer.categorize("Milk 2% Gallon"), Category::Groceries);
        assert_eq!(categorizer.categorize("CHEESE BURGER"), Category::Groceries);
        assert_eq!(categorizer.categorize("Large Fries"), Category::Restaurant);
        assert_eq!(categorizer.categorize("Vitamin D3 1000 IU"), Category::Pharmacy);
        assert_eq!(categorizer.categorize("Phone Charger"), Category::Retail);
        assert_eq!(categorizer.categorize("Mystery Thing"), Category::Other);
    }

    #[test]
    fn test_closure_categorizer() {
        let always_retail = |_: &str| Category::Retail;
        assert_eq!(always_retail.categorize("anything"), Category::Retail);
    }
}
