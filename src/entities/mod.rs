// Entity Models
//
// Records kept by the store: web results, category boxes and the homepage
// singleton. Each has a store-assigned id that never changes.

pub mod category;
pub mod homepage;
pub mod web_result;

pub use category::{default_category_boxes, CategoryBox, CategoryField};
pub use homepage::{HomepageContent, DEFAULT_HEADING};
pub use web_result::{non_empty, parse_display_order, ResultDraft, ResultKind, WebResult};
