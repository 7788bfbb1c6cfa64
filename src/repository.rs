// Content Repository - the narrow interface every surface talks to
//
// Front ends and the admin editors depend on this trait only, so they can run
// against SQLite in production and an in-memory store in tests.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::entities::{CategoryBox, HomepageContent, ResultDraft, WebResult};
use crate::error::StoreError;

pub trait ContentRepository {
    /// The homepage singleton, if one has been stored.
    fn homepage(&self) -> Result<Option<HomepageContent>, StoreError>;

    /// Write heading and paragraph, creating the singleton when missing.
    fn update_homepage(
        &self,
        heading: &str,
        paragraph: &str,
    ) -> Result<HomepageContent, StoreError>;

    /// Category boxes ascending by `order_index`.
    fn list_categories(&self) -> Result<Vec<CategoryBox>, StoreError>;

    fn create_category(
        &self,
        title: &str,
        description: &str,
        order_index: i64,
    ) -> Result<CategoryBox, StoreError>;

    fn update_category(&self, id: &str, title: &str, description: &str) -> Result<(), StoreError>;

    /// Web results ascending by `display_order`, ties in insertion order.
    fn list_results(&self) -> Result<Vec<WebResult>, StoreError>;

    /// Insert when `id` is `None`, otherwise overwrite the existing row.
    fn upsert_result(
        &self,
        id: Option<&str>,
        draft: &ResultDraft,
    ) -> Result<WebResult, StoreError>;

    fn delete_result(&self, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
struct MemoryTables {
    homepage: Option<HomepageContent>,
    categories: Vec<CategoryBox>,
    results: Vec<WebResult>,
    fail_next: Option<StoreError>,
}

/// In-process store. Rows keep insertion order, which is what breaks ties
/// between equal ordering keys.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next repository call fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        if let Ok(mut tables) = self.tables.write() {
            tables.fail_next = Some(err);
        }
    }

    fn with_tables<T>(
        &self,
        f: impl FnOnce(&mut MemoryTables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::store("memory store lock poisoned"))?;

        if let Some(err) = tables.fail_next.take() {
            return Err(err);
        }

        f(&mut tables)
    }
}

impl ContentRepository for MemoryStore {
    fn homepage(&self) -> Result<Option<HomepageContent>, StoreError> {
        self.with_tables(|t| Ok(t.homepage.clone()))
    }

    fn update_homepage(
        &self,
        heading: &str,
        paragraph: &str,
    ) -> Result<HomepageContent, StoreError> {
        self.with_tables(|t| {
            let content = t.homepage.get_or_insert_with(|| HomepageContent {
                id: new_id(),
                heading: String::new(),
                paragraph: String::new(),
            });
            content.heading = heading.to_string();
            content.paragraph = paragraph.to_string();
            Ok(content.clone())
        })
    }

    fn list_categories(&self) -> Result<Vec<CategoryBox>, StoreError> {
        self.with_tables(|t| {
            let mut categories = t.categories.clone();
            // stable sort keeps insertion order for ties
            categories.sort_by_key(|c| c.order_index);
            Ok(categories)
        })
    }

    fn create_category(
        &self,
        title: &str,
        description: &str,
        order_index: i64,
    ) -> Result<CategoryBox, StoreError> {
        self.with_tables(|t| {
            let category = CategoryBox {
                id: new_id(),
                title: title.to_string(),
                description: description.to_string(),
                order_index,
            };
            t.categories.push(category.clone());
            Ok(category)
        })
    }

    fn update_category(&self, id: &str, title: &str, description: &str) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let category = t
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| StoreError::not_found("category", id))?;
            category.title = title.to_string();
            category.description = description.to_string();
            Ok(())
        })
    }

    fn list_results(&self) -> Result<Vec<WebResult>, StoreError> {
        self.with_tables(|t| {
            let mut results = t.results.clone();
            results.sort_by_key(|r| r.display_order);
            Ok(results)
        })
    }

    fn upsert_result(
        &self,
        id: Option<&str>,
        draft: &ResultDraft,
    ) -> Result<WebResult, StoreError> {
        self.with_tables(|t| match id {
            Some(id) => {
                let existing = t
                    .results
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| StoreError::not_found("web result", id))?;
                *existing = WebResult::from_draft(id.to_string(), draft);
                debug!(id, "updated web result");
                Ok(existing.clone())
            }
            None => {
                let result = WebResult::from_draft(new_id(), draft);
                t.results.push(result.clone());
                debug!(id = %result.id, "inserted web result");
                Ok(result)
            }
        })
    }

    fn delete_result(&self, id: &str) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let before = t.results.len();
            t.results.retain(|r| r.id != id);
            if t.results.len() == before {
                return Err(StoreError::not_found("web result", id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ResultKind;

    fn create_test_draft(name: &str, order: i64) -> ResultDraft {
        ResultDraft {
            name: name.to_string(),
            title: format!("{} title", name),
            description: "desc".to_string(),
            display_order: order,
            ..ResultDraft::default()
        }
    }

    #[test]
    fn test_results_sorted_with_stable_ties() {
        let store = MemoryStore::new();
        store.upsert_result(None, &create_test_draft("c", 2)).unwrap();
        store.upsert_result(None, &create_test_draft("a", 1)).unwrap();
        store.upsert_result(None, &create_test_draft("b", 1)).unwrap();

        let names: Vec<String> = store
            .list_results()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = MemoryStore::new();
        let created = store.upsert_result(None, &create_test_draft("a", 1)).unwrap();

        let mut draft = create_test_draft("a2", 5);
        draft.kind = ResultKind::Sponsored;
        let updated = store.upsert_result(Some(&created.id), &draft).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.kind, ResultKind::Sponsored);
        assert_eq!(store.list_results().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let store = MemoryStore::new();
        let draft = create_test_draft("a", 1);

        assert!(matches!(
            store.upsert_result(Some("missing"), &draft),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_result("missing"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_category("missing", "t", "d"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_homepage_created_on_first_update() {
        let store = MemoryStore::new();
        assert_eq!(store.homepage().unwrap(), None);

        let first = store.update_homepage("Heading", "Body").unwrap();
        let second = store.update_homepage("Heading 2", "Body 2").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.homepage().unwrap().unwrap().heading, "Heading 2");
    }

    #[test]
    fn test_fail_next_only_fails_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreError::store("boom"));

        assert!(store.list_categories().is_err());
        assert!(store.list_categories().is_ok());
    }
}
