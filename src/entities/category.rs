// 🗂️ Category Box Entity - labeled boxes on the landing page

use serde::{Deserialize, Serialize};

/// A labeled box listed under "Related categories" on the landing page.
///
/// Ordered by `order_index`; ties keep the store's insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBox {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order_index: i64,
}

/// Which text field of a category box an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryField {
    Title,
    Description,
}

impl CategoryBox {
    pub fn set_field(&mut self, field: CategoryField, value: impl Into<String>) {
        match field {
            CategoryField::Title => self.title = value.into(),
            CategoryField::Description => self.description = value.into(),
        }
    }
}

/// Demo boxes `seed_defaults` writes into an empty store.
pub fn default_category_boxes() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Personal Loans",
            "Compare personal loan offers and find a rate that fits your budget.",
        ),
        (
            "Student Credit Cards",
            "Build credit while in school with cards designed for students.",
        ),
        (
            "Budgeting Apps",
            "Track spending and plan ahead with simple budgeting tools.",
        ),
        (
            "Scholarships & Grants",
            "Find free money for college that you never have to pay back.",
        ),
    ]
}
