use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::entities::{
    default_category_boxes, non_empty, parse_display_order, CategoryBox, HomepageContent,
    ResultDraft, ResultKind, WebResult, DEFAULT_HEADING,
};
use crate::error::StoreError;
use crate::repository::{new_id, ContentRepository};

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // WAL for crash recovery; in-memory databases report "memory" and that's fine
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Homepage Content (singleton heading + paragraph)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS homepage_content (
            id TEXT PRIMARY KEY,
            heading TEXT NOT NULL,
            paragraph TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Category Boxes
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS category_boxes (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            order_index INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Web Results
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS web_results (
            id TEXT PRIMARY KEY,
            category_id TEXT,
            name TEXT NOT NULL,
            link TEXT,
            logo_url TEXT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('organic', 'sponsored')),
            display_order INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_order ON category_boxes(order_index)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_results_order ON web_results(display_order)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// `ContentRepository` over a single SQLite connection.
///
/// Ties in ordering columns fall back to `rowid`, i.e. insertion order.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "opened content database");
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn count_results(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM web_results", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<WebResult> {
    let kind: String = row.get(7)?;
    let kind = kind.parse::<ResultKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(WebResult {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        link: row.get(3)?,
        logo_url: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        kind,
        display_order: row.get(8)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryBox> {
    Ok(CategoryBox {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        order_index: row.get(3)?,
    })
}

impl ContentRepository for SqliteStore {
    fn homepage(&self) -> Result<Option<HomepageContent>, StoreError> {
        let content = self
            .conn
            .query_row(
                "SELECT id, heading, paragraph FROM homepage_content ORDER BY rowid LIMIT 1",
                [],
                |row| {
                    Ok(HomepageContent {
                        id: row.get(0)?,
                        heading: row.get(1)?,
                        paragraph: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(content)
    }

    fn update_homepage(
        &self,
        heading: &str,
        paragraph: &str,
    ) -> Result<HomepageContent, StoreError> {
        let now = Utc::now().to_rfc3339();

        let id = match self.homepage()? {
            Some(existing) => {
                self.conn.execute(
                    "UPDATE homepage_content SET heading = ?1, paragraph = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![heading, paragraph, now, existing.id],
                )?;
                existing.id
            }
            None => {
                let id = new_id();
                self.conn.execute(
                    "INSERT INTO homepage_content (id, heading, paragraph, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, heading, paragraph, now],
                )?;
                id
            }
        };

        debug!(%id, "saved homepage content");

        Ok(HomepageContent {
            id,
            heading: heading.to_string(),
            paragraph: paragraph.to_string(),
        })
    }

    fn list_categories(&self) -> Result<Vec<CategoryBox>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, order_index
             FROM category_boxes
             ORDER BY order_index ASC, rowid ASC",
        )?;

        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    fn create_category(
        &self,
        title: &str,
        description: &str,
        order_index: i64,
    ) -> Result<CategoryBox, StoreError> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO category_boxes (id, title, description, order_index, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, title, description, order_index, Utc::now().to_rfc3339()],
        )?;

        Ok(CategoryBox {
            id,
            title: title.to_string(),
            description: description.to_string(),
            order_index,
        })
    }

    fn update_category(&self, id: &str, title: &str, description: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE category_boxes SET title = ?1, description = ?2, updated_at = ?3
             WHERE id = ?4",
            params![title, description, Utc::now().to_rfc3339(), id],
        )?;

        if changed == 0 {
            return Err(StoreError::not_found("category", id));
        }

        Ok(())
    }

    fn list_results(&self) -> Result<Vec<WebResult>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category_id, name, link, logo_url, title, description, kind, display_order
             FROM web_results
             ORDER BY display_order ASC, rowid ASC",
        )?;

        let results = stmt
            .query_map([], result_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn upsert_result(
        &self,
        id: Option<&str>,
        draft: &ResultDraft,
    ) -> Result<WebResult, StoreError> {
        let now = Utc::now().to_rfc3339();

        match id {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE web_results
                     SET category_id = ?1, name = ?2, link = ?3, logo_url = ?4, title = ?5,
                         description = ?6, kind = ?7, display_order = ?8, updated_at = ?9
                     WHERE id = ?10",
                    params![
                        draft.category_id,
                        draft.name,
                        draft.link,
                        draft.logo_url,
                        draft.title,
                        draft.description,
                        draft.kind.as_str(),
                        draft.display_order,
                        now,
                        id,
                    ],
                )?;

                if changed == 0 {
                    return Err(StoreError::not_found("web result", id));
                }

                debug!(id, "updated web result");
                Ok(WebResult::from_draft(id.to_string(), draft))
            }
            None => {
                let id = new_id();
                self.conn.execute(
                    "INSERT INTO web_results (
                        id, category_id, name, link, logo_url, title, description,
                        kind, display_order, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        id,
                        draft.category_id,
                        draft.name,
                        draft.link,
                        draft.logo_url,
                        draft.title,
                        draft.description,
                        draft.kind.as_str(),
                        draft.display_order,
                        now,
                    ],
                )?;

                debug!(%id, "inserted web result");
                Ok(WebResult::from_draft(id, draft))
            }
        }
    }

    fn delete_result(&self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM web_results WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(StoreError::not_found("web result", id));
        }

        Ok(())
    }
}

// ============================================================================
// IMPORT & SEED
// ============================================================================

/// One CSV row of the results import file.
#[derive(Debug, Deserialize)]
struct ResultRow {
    name: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    logo_url: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    display_order: String,
    #[serde(default)]
    category_id: String,
}

impl ResultRow {
    fn into_draft(self) -> Result<ResultDraft> {
        let kind = if self.kind.is_empty() {
            ResultKind::Organic
        } else {
            self.kind.parse()?
        };

        Ok(ResultDraft {
            category_id: non_empty(&self.category_id),
            name: self.name,
            title: self.title,
            description: self.description,
            link: non_empty(&self.link),
            logo_url: non_empty(&self.logo_url),
            kind,
            display_order: parse_display_order(&self.display_order),
        })
    }
}

pub fn load_results_csv(csv_path: &Path) -> Result<Vec<ResultDraft>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut drafts = Vec::new();

    for (line, row) in rdr.deserialize::<ResultRow>().enumerate() {
        let row = row.context("Failed to deserialize result row")?;
        let draft = row
            .into_draft()
            .with_context(|| format!("Invalid result on data row {}", line + 1))?;
        drafts.push(draft);
    }

    Ok(drafts)
}

/// Insert drafts as new results, returning how many were stored.
pub fn import_results<R: ContentRepository + ?Sized>(
    repo: &R,
    drafts: &[ResultDraft],
) -> Result<usize> {
    let mut inserted = 0;

    for draft in drafts {
        repo.upsert_result(None, draft)
            .with_context(|| format!("Failed to insert result {}", draft.name))?;
        inserted += 1;
    }

    info!(inserted, "imported web results");
    Ok(inserted)
}

/// Summary of what `seed_defaults` created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub homepage_created: bool,
    pub categories_created: usize,
}

/// Give an empty store its default homepage row and category boxes.
/// Running it again changes nothing.
pub fn seed_defaults<R: ContentRepository + ?Sized>(repo: &R) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if repo.homepage()?.is_none() {
        repo.update_homepage(DEFAULT_HEADING, "")?;
        report.homepage_created = true;
    }

    if repo.list_categories()?.is_empty() {
        for (index, (title, description)) in default_category_boxes().into_iter().enumerate() {
            repo.create_category(title, description, index as i64)?;
            report.categories_created += 1;
        }
    }

    info!(
        homepage = report.homepage_created,
        categories = report.categories_created,
        "seeded default content"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV_HEADER: &str = "name,title,description,link,logo_url,type,display_order,category_id";

    fn create_test_draft(name: &str, kind: ResultKind, order: i64) -> ResultDraft {
        ResultDraft {
            category_id: None,
            name: name.to_string(),
            title: format!("{} title", name),
            description: format!("{} description", name),
            link: Some(format!("https://{}", name)),
            logo_url: None,
            kind,
            display_order: order,
        }
    }

    #[test]
    fn test_results_ordered_by_display_order_then_insertion() {
        let store = SqliteStore::open_in_memory().unwrap();

        let drafts = [
            create_test_draft("third.com", ResultKind::Organic, 5),
            create_test_draft("first.com", ResultKind::Sponsored, 1),
            create_test_draft("second.com", ResultKind::Organic, 1),
        ];
        for draft in &drafts {
            store.upsert_result(None, draft).unwrap();
        }

        let names: Vec<String> = store
            .list_results()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["first.com", "second.com", "third.com"]);
    }

    #[test]
    fn test_upsert_update_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store
            .upsert_result(None, &create_test_draft("a.com", ResultKind::Organic, 0))
            .unwrap();

        let mut draft = create_test_draft("a.com", ResultKind::Sponsored, 3);
        draft.link = None;
        store.upsert_result(Some(&created.id), &draft).unwrap();

        let stored = store.list_results().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created.id);
        assert_eq!(stored[0].kind, ResultKind::Sponsored);
        assert_eq!(stored[0].link, None);
        assert_eq!(stored[0].display_order, 3);

        store.delete_result(&created.id).unwrap();
        assert_eq!(store.count_results().unwrap(), 0);
        assert!(matches!(
            store.delete_result(&created.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_unknown_result_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let draft = create_test_draft("a.com", ResultKind::Organic, 0);

        assert!(matches!(
            store.upsert_result(Some("nope"), &draft),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_kind_check_constraint() {
        let store = SqliteStore::open_in_memory().unwrap();

        let err = store
            .connection()
            .execute(
                "INSERT INTO web_results (id, name, title, description, kind, updated_at)
                 VALUES ('x', 'n', 't', 'd', 'banner', 'now')",
                [],
            )
            .unwrap_err();

        assert!(matches!(StoreError::from(err), StoreError::Store { .. }));
    }

    #[test]
    fn test_homepage_singleton() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.homepage().unwrap().is_none());

        let first = store.update_homepage("Heading", "Paragraph").unwrap();
        let second = store.update_homepage("New heading", "New paragraph").unwrap();

        assert_eq!(first.id, second.id);
        let stored = store.homepage().unwrap().unwrap();
        assert_eq!(stored.heading, "New heading");
        assert_eq!(stored.paragraph, "New paragraph");
    }

    #[test]
    fn test_categories_crud() {
        let store = SqliteStore::open_in_memory().unwrap();
        let b = store.create_category("B", "second", 2).unwrap();
        store.create_category("A", "first", 1).unwrap();

        store.update_category(&b.id, "B2", "second edited").unwrap();

        let categories = store.list_categories().unwrap();
        assert_eq!(categories[0].title, "A");
        assert_eq!(categories[1].title, "B2");
        assert_eq!(categories[1].description, "second edited");
        assert!(store.update_category("nope", "x", "y").is_err());
    }

    #[test]
    fn test_seed_defaults_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = seed_defaults(&store).unwrap();
        let second = seed_defaults(&store).unwrap();

        assert!(first.homepage_created);
        assert_eq!(first.categories_created, default_category_boxes().len());
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.homepage().unwrap().unwrap().heading, DEFAULT_HEADING);
    }

    #[test]
    fn test_load_results_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", CSV_HEADER).unwrap();
        writeln!(file, "alpha.com,Alpha Loans,Fast loans,https://alpha.com,,sponsored,1,").unwrap();
        writeln!(file, "beta.com,Beta Credit,Cards,,,organic,2x,cat-1").unwrap();
        writeln!(file, "gamma.com,Gamma Cash,Cash,,,,,").unwrap();
        file.flush().unwrap();

        let drafts = load_results_csv(file.path()).unwrap();

        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].kind, ResultKind::Sponsored);
        assert_eq!(drafts[0].link.as_deref(), Some("https://alpha.com"));
        assert_eq!(drafts[0].logo_url, None);
        assert_eq!(drafts[1].display_order, 2);
        assert_eq!(drafts[1].category_id.as_deref(), Some("cat-1"));
        assert_eq!(drafts[2].kind, ResultKind::Organic);
        assert_eq!(drafts[2].display_order, 0);

        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(import_results(&store, &drafts).unwrap(), 3);
        assert_eq!(store.count_results().unwrap(), 3);
    }

    #[test]
    fn test_load_results_csv_rejects_unknown_type() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", CSV_HEADER).unwrap();
        writeln!(file, "alpha.com,Alpha,,,,banner,1,").unwrap();
        file.flush().unwrap();

        assert!(load_results_csv(file.path()).is_err());
    }
}
