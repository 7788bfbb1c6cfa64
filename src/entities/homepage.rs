// 🏠 Homepage Content - the singleton heading + paragraph

use serde::{Deserialize, Serialize};

pub const DEFAULT_HEADING: &str =
    "Five Ways to Make the Transition from High School to College Easy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageContent {
    pub id: String,
    pub heading: String,
    pub paragraph: String,
}

impl HomepageContent {
    /// What the landing page shows before (or without) a stored row.
    pub fn fallback() -> Self {
        HomepageContent {
            id: String::new(),
            heading: DEFAULT_HEADING.to_string(),
            paragraph: String::new(),
        }
    }
}
