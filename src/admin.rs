// 🛠️ Admin Edit Surface - form state mapped 1:1 onto repository writes
//
// Editors hold the form state; the caller hands them a repository when the
// user saves. Every outcome becomes a Notice, success or failure.

use serde::Serialize;
use tracing::{info, warn};

use crate::entities::{
    non_empty, parse_display_order, CategoryBox, CategoryField, HomepageContent, ResultDraft,
    ResultKind, WebResult,
};
use crate::error::StoreError;
use crate::repository::ContentRepository;

// ============================================================================
// NOTICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Non-blocking notification shown after an admin action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Notice {
            title: "Success".to_string(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    /// Outcome of a successful homepage content save.
    pub fn saved() -> Self {
        Notice {
            title: "Success!".to_string(),
            description: "Content updated successfully.".to_string(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn error(err: &StoreError) -> Self {
        Notice {
            title: "Error".to_string(),
            description: err.to_string(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

// ============================================================================
// RESULT FORM
// ============================================================================

/// Raw form inputs of the result dialog. Optional fields are plain strings
/// here; `to_draft` turns blanks into nulls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultForm {
    pub category_id: String,
    pub name: String,
    pub link: String,
    pub logo_url: String,
    pub title: String,
    pub description: String,
    pub kind: ResultKind,
    pub display_order: String,
}

impl ResultForm {
    /// Empty form preselecting the first category.
    pub fn blank(categories: &[CategoryBox]) -> Self {
        ResultForm {
            category_id: categories.first().map(|c| c.id.clone()).unwrap_or_default(),
            display_order: "0".to_string(),
            ..ResultForm::default()
        }
    }

    pub fn from_result(result: &WebResult) -> Self {
        ResultForm {
            category_id: result.category_id.clone().unwrap_or_default(),
            name: result.name.clone(),
            link: result.link.clone().unwrap_or_default(),
            logo_url: result.logo_url.clone().unwrap_or_default(),
            title: result.title.clone(),
            description: result.description.clone(),
            kind: result.kind,
            display_order: result.display_order.to_string(),
        }
    }

    /// Form inputs for a draft that arrived as JSON rather than typed in.
    pub fn from_draft(draft: &ResultDraft) -> Self {
        ResultForm {
            category_id: draft.category_id.clone().unwrap_or_default(),
            name: draft.name.clone(),
            link: draft.link.clone().unwrap_or_default(),
            logo_url: draft.logo_url.clone().unwrap_or_default(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            kind: draft.kind,
            display_order: draft.display_order.to_string(),
        }
    }

    pub fn to_draft(&self) -> ResultDraft {
        ResultDraft {
            category_id: non_empty(&self.category_id),
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            link: non_empty(&self.link),
            logo_url: non_empty(&self.logo_url),
            kind: self.kind,
            display_order: parse_display_order(&self.display_order),
        }
    }
}

// ============================================================================
// RESULT EDITOR
// ============================================================================

/// State of the add/edit result dialog.
#[derive(Debug, Clone, Default)]
pub struct ResultEditor {
    pub open: bool,
    pub editing: Option<WebResult>,
    pub form: ResultForm,
    categories: Vec<CategoryBox>,
}

impl ResultEditor {
    pub fn new(categories: Vec<CategoryBox>) -> Self {
        ResultEditor {
            open: false,
            editing: None,
            form: ResultForm::blank(&categories),
            categories,
        }
    }

    pub fn categories(&self) -> &[CategoryBox] {
        &self.categories
    }

    fn reset(&mut self) {
        self.form = ResultForm::blank(&self.categories);
        self.editing = None;
    }

    /// "Add New Result"
    pub fn open_new(&mut self) {
        self.reset();
        self.open = true;
    }

    pub fn edit(&mut self, result: &WebResult) {
        self.form = ResultForm::from_result(result);
        self.editing = Some(result.clone());
        self.open = true;
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.reset();
    }

    /// Insert or update. On success the dialog closes and resets; on failure
    /// it stays open with the user's input intact.
    pub fn try_submit<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
    ) -> Result<WebResult, StoreError> {
        let draft = self.form.to_draft();
        let id = self.editing.as_ref().map(|r| r.id.clone());

        let saved = repo.upsert_result(id.as_deref(), &draft)?;

        info!(id = %saved.id, created = id.is_none(), "saved web result");
        self.open = false;
        self.reset();
        Ok(saved)
    }

    pub fn submit<R: ContentRepository + ?Sized>(&mut self, repo: &R) -> Notice {
        let verb = if self.editing.is_some() { "updated" } else { "created" };

        match self.try_submit(repo) {
            Ok(_) => Notice::success(format!("Result {} successfully", verb)),
            Err(err) => {
                warn!(error = %err, "failed to save web result");
                Notice::error(&err)
            }
        }
    }

    pub fn try_delete<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
        id: &str,
    ) -> Result<(), StoreError> {
        repo.delete_result(id)?;
        info!(id, "deleted web result");
        Ok(())
    }

    pub fn delete<R: ContentRepository + ?Sized>(&mut self, repo: &R, id: &str) -> Notice {
        match self.try_delete(repo, id) {
            Ok(()) => Notice::success("Result deleted successfully"),
            Err(err) => {
                warn!(error = %err, id, "failed to delete web result");
                Notice::error(&err)
            }
        }
    }

    /// Category title for the results table, if the id is known.
    pub fn category_title(&self, category_id: Option<&str>) -> Option<&str> {
        let id = category_id?;
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.title.as_str())
    }
}

// ============================================================================
// CONTENT EDITOR (homepage + category boxes)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ContentEditor {
    pub heading: String,
    pub paragraph: String,
    pub categories: Vec<CategoryBox>,
    pub saving: bool,
}

impl ContentEditor {
    pub fn load<R: ContentRepository + ?Sized>(repo: &R) -> Result<Self, StoreError> {
        let content = repo.homepage()?.unwrap_or_else(HomepageContent::fallback);
        let categories = repo.list_categories()?;

        Ok(ContentEditor {
            heading: content.heading,
            paragraph: content.paragraph,
            categories,
            saving: false,
        })
    }

    pub fn set_heading(&mut self, heading: impl Into<String>) {
        self.heading = heading.into();
    }

    pub fn set_paragraph(&mut self, paragraph: impl Into<String>) {
        self.paragraph = paragraph.into();
    }

    /// Edit a field of one box locally. Returns false (and changes nothing)
    /// for an unknown id.
    pub fn update_category(
        &mut self,
        id: &str,
        field: CategoryField,
        value: impl Into<String>,
    ) -> bool {
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.set_field(field, value);
                true
            }
            None => false,
        }
    }

    /// Write homepage text, then every box in order. Stops at the first
    /// failing write; earlier writes stay applied.
    pub fn try_save<R: ContentRepository + ?Sized>(
        &mut self,
        repo: &R,
    ) -> Result<HomepageContent, StoreError> {
        self.saving = true;
        let outcome = self.write_all(repo);
        self.saving = false;

        let content = outcome?;
        info!(categories = self.categories.len(), "saved homepage content");
        Ok(content)
    }

    pub fn save<R: ContentRepository + ?Sized>(&mut self, repo: &R) -> Notice {
        match self.try_save(repo) {
            Ok(_) => Notice::saved(),
            Err(err) => {
                warn!(error = %err, "failed to save homepage content");
                Notice::error(&err)
            }
        }
    }

    fn write_all<R: ContentRepository + ?Sized>(
        &self,
        repo: &R,
    ) -> Result<HomepageContent, StoreError> {
        let content = repo.update_homepage(&self.heading, &self.paragraph)?;

        for category in &self.categories {
            repo.update_category(&category.id, &category.title, &category.description)?;
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn seeded_store() -> (MemoryStore, Vec<CategoryBox>) {
        let store = MemoryStore::new();
        store.create_category("Loans", "Loan offers", 0).unwrap();
        store.create_category("Cards", "Card offers", 1).unwrap();
        let categories = store.list_categories().unwrap();
        (store, categories)
    }

    #[test]
    fn test_blank_form_defaults() {
        let (_, categories) = seeded_store();
        let form = ResultForm::blank(&categories);

        assert_eq!(form.category_id, categories[0].id);
        assert_eq!(form.kind, ResultKind::Organic);
        assert_eq!(form.to_draft().display_order, 0);
        assert_eq!(ResultForm::blank(&[]).to_draft().category_id, None);
    }

    #[test]
    fn test_form_maps_blanks_to_none() {
        let form = ResultForm {
            name: "a.com".to_string(),
            title: "A".to_string(),
            link: String::new(),
            logo_url: "https://a.com/logo.png".to_string(),
            display_order: "4x".to_string(),
            ..ResultForm::default()
        };

        let draft = form.to_draft();

        assert_eq!(draft.link, None);
        assert_eq!(draft.logo_url.as_deref(), Some("https://a.com/logo.png"));
        assert_eq!(draft.display_order, 4);
    }

    #[test]
    fn test_form_from_draft_keeps_values() {
        let draft = ResultDraft {
            category_id: Some("cat-1".to_string()),
            name: "a.com".to_string(),
            title: "A".to_string(),
            description: "d".to_string(),
            link: Some("https://a.com".to_string()),
            logo_url: Some(String::new()),
            kind: ResultKind::Sponsored,
            display_order: i64::MIN,
        };

        let round_tripped = ResultForm::from_draft(&draft).to_draft();

        assert_eq!(round_tripped, draft.clone().normalized());
        assert_eq!(round_tripped.logo_url, None);
        assert_eq!(round_tripped.display_order, i64::MIN);
    }

    #[test]
    fn test_create_then_edit_result() {
        let (store, categories) = seeded_store();
        let mut editor = ResultEditor::new(categories);

        editor.open_new();
        editor.form.name = "alpha.com".to_string();
        editor.form.title = "Alpha Loans".to_string();
        editor.form.kind = ResultKind::Sponsored;
        let notice = editor.submit(&store);

        assert_eq!(notice.description, "Result created successfully");
        assert!(!editor.open);
        assert_eq!(editor.form, ResultForm::blank(editor.categories()));

        let created = store.list_results().unwrap().remove(0);
        assert_eq!(created.link, None);
        assert_eq!(editor.category_title(created.category_id.as_deref()), Some("Loans"));

        editor.edit(&created);
        assert_eq!(editor.form.kind, ResultKind::Sponsored);
        editor.form.link = "https://alpha.com".to_string();
        let notice = editor.submit(&store);

        assert_eq!(notice.description, "Result updated successfully");
        let stored = store.list_results().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].link.as_deref(), Some("https://alpha.com"));
    }

    #[test]
    fn test_failed_submit_keeps_dialog_open() {
        let (store, categories) = seeded_store();
        let mut editor = ResultEditor::new(categories);
        editor.open_new();
        editor.form.name = "keep-me.com".to_string();

        store.fail_next(StoreError::store("disk full"));
        let notice = editor.submit(&store);

        assert!(notice.is_error());
        assert_eq!(notice.description, "store error: disk full");
        assert!(editor.open);
        assert_eq!(editor.form.name, "keep-me.com");
    }

    #[test]
    fn test_delete_result() {
        let (store, categories) = seeded_store();
        let created = store.upsert_result(None, &ResultDraft::default()).unwrap();
        let mut editor = ResultEditor::new(categories);

        assert!(!editor.delete(&store, &created.id).is_error());
        assert!(editor.delete(&store, &created.id).is_error());
    }

    #[test]
    fn test_cancel_resets_form() {
        let (_, categories) = seeded_store();
        let mut editor = ResultEditor::new(categories);
        editor.open_new();
        editor.form.title = "draft".to_string();

        editor.cancel();

        assert!(!editor.open);
        assert!(editor.editing.is_none());
        assert!(editor.form.title.is_empty());
    }

    #[test]
    fn test_content_editor_round_trip() {
        let (store, _) = seeded_store();
        let mut editor = ContentEditor::load(&store).unwrap();
        assert_eq!(editor.heading, crate::entities::DEFAULT_HEADING);

        let loans_id = editor.categories[0].id.clone();
        editor.set_heading("Money made simple");
        editor.set_paragraph("Compare offers.");
        assert!(editor.update_category(&loans_id, CategoryField::Title, "Personal Loans"));
        assert!(!editor.update_category("unknown", CategoryField::Title, "ignored"));

        let notice = editor.save(&store);

        assert_eq!(notice.title, "Success!");
        assert!(!editor.saving);
        let reloaded = ContentEditor::load(&store).unwrap();
        assert_eq!(reloaded.heading, "Money made simple");
        assert_eq!(reloaded.paragraph, "Compare offers.");
        assert_eq!(reloaded.categories[0].title, "Personal Loans");
    }

    #[test]
    fn test_content_editor_reports_store_error() {
        let (store, _) = seeded_store();
        let mut editor = ContentEditor::load(&store).unwrap();

        store.fail_next(StoreError::Network {
            message: "timeout".to_string(),
        });
        let notice = editor.save(&store);

        assert!(notice.is_error());
        assert_eq!(notice.description, "network error: timeout");
    }
}
