//! services/client/src/stores/documents.rs
//!
//! The document store: holds the authenticated user's document collection
//! and the currently selected document, and exposes the CRUD and
//! question-asking operations. Every mutation reconciles local state with
//! the server's response; every failure leaves the collection at its
//! last-known-good value and records the error without poisoning the store.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use askdoc_core::domain::{Document, DocumentUpload};
use askdoc_core::ports::{DocumentApi, PortError, PortResult};

//=========================================================================================
// Store State
//=========================================================================================

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<Document>,
    selected: Option<Document>,
    last_error: Option<String>,
    in_flight: bool,
}

//=========================================================================================
// The Store
//=========================================================================================

pub struct DocumentStore {
    api: Arc<dyn DocumentApi>,
    inner: RwLock<Inner>,
}

impl DocumentStore {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self {
            api,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn begin(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.in_flight = true;
        inner.last_error = None;
    }

    fn fail(&self, err: &PortError) {
        let mut inner = self.inner.write().unwrap();
        inner.in_flight = false;
        inner.last_error = Some(err.to_string());
    }

    /// Replaces the entire local collection with the server's current
    /// listing. Order is whatever the server returns.
    pub async fn fetch_documents(&self) -> PortResult<()> {
        self.begin();
        match self.api.list_documents().await {
            Ok(documents) => {
                debug!(count = documents.len(), "fetched document listing");
                let mut inner = self.inner.write().unwrap();
                inner.documents = documents;
                inner.in_flight = false;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Uploads a new document. On success the server-returned record is
    /// prepended (new items appear first) and returned to the caller so
    /// it can, for example, auto-select it.
    pub async fn upload_document(&self, upload: DocumentUpload) -> PortResult<Document> {
        self.begin();
        match self.api.upload_document(&upload).await {
            Ok(document) => {
                info!(id = document.id, title = %document.title, "uploaded document");
                let mut inner = self.inner.write().unwrap();
                inner.documents.insert(0, document.clone());
                inner.in_flight = false;
                Ok(document)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Renames a document. Only the title of the matching local record is
    /// touched; when that record is currently selected, the selection's
    /// title follows so the list and detail views stay consistent.
    pub async fn update_document(&self, id: i64, title: &str) -> PortResult<Document> {
        self.begin();
        match self.api.rename_document(id, title).await {
            Ok(updated) => {
                let mut inner = self.inner.write().unwrap();
                if let Some(doc) = inner.documents.iter_mut().find(|d| d.id == id) {
                    doc.title = updated.title.clone();
                }
                if let Some(selected) = inner.selected.as_mut() {
                    if selected.id == id {
                        selected.title = updated.title.clone();
                    }
                }
                inner.in_flight = false;
                Ok(updated)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Deletes a document. On success the local record is removed and a
    /// selection pointing at it is cleared. No undo.
    pub async fn delete_document(&self, id: i64) -> PortResult<()> {
        self.begin();
        match self.api.delete_document(id).await {
            Ok(()) => {
                info!(id, "deleted document");
                let mut inner = self.inner.write().unwrap();
                inner.documents.retain(|d| d.id != id);
                if inner.selected.as_ref().is_some_and(|d| d.id == id) {
                    inner.selected = None;
                }
                inner.in_flight = false;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Pure local state transition; no network call.
    pub fn select_document(&self, document: Option<Document>) {
        self.inner.write().unwrap().selected = document;
    }

    /// Asks a question about one document and returns the answer text.
    /// Never mutates the collection; on failure the caller's conversation
    /// history is left exactly as it was.
    pub async fn ask_question(&self, document_id: i64, question: &str) -> PortResult<String> {
        self.begin();
        match self.api.ask_question(document_id, question).await {
            Ok(answer) => {
                self.inner.write().unwrap().in_flight = false;
                Ok(answer)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Drops everything. Called when the session becomes Anonymous.
    pub fn reset(&self) {
        *self.inner.write().unwrap() = Inner::default();
    }

    //-------------------------------------------------------------------------------------
    // Accessors (cloned snapshots; consumers re-render from these)
    //-------------------------------------------------------------------------------------

    pub fn documents(&self) -> Vec<Document> {
        self.inner.read().unwrap().documents.clone()
    }

    pub fn selected(&self) -> Option<Document> {
        self.inner.read().unwrap().selected.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.read().unwrap().last_error.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.inner.read().unwrap().in_flight
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn doc(id: i64, title: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            file: format!("/media/documents/{}.pdf", id),
            file_name: format!("{}.pdf", title),
            file_type: "application/pdf".to_string(),
            file_size: 1024,
            uploaded_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    /// Programmable fake backend. When `failing` is set every operation
    /// returns a rejected error instead of its canned response.
    #[derive(Default)]
    struct FakeApi {
        listing: Mutex<Vec<Document>>,
        answer: Mutex<Option<String>>,
        failing: bool,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        fn reject<T>(&self) -> PortResult<T> {
            Err(PortError::Rejected("backend said no".into()))
        }
    }

    #[async_trait]
    impl DocumentApi for FakeApi {
        async fn list_documents(&self) -> PortResult<Vec<Document>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return self.reject();
            }
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn upload_document(&self, upload: &DocumentUpload) -> PortResult<Document> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return self.reject();
            }
            let mut created = doc(99, &upload.title);
            created.file_name = upload.file_name.clone();
            Ok(created)
        }

        async fn rename_document(&self, id: i64, title: &str) -> PortResult<Document> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return self.reject();
            }
            Ok(doc(id, title))
        }

        async fn delete_document(&self, _id: i64) -> PortResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return self.reject();
            }
            Ok(())
        }

        async fn ask_question(&self, _document_id: i64, _question: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return self.reject();
            }
            Ok(self
                .answer
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "the answer".to_string()))
        }
    }

    fn store_with(api: FakeApi) -> (DocumentStore, Arc<FakeApi>) {
        let api = Arc::new(api);
        (DocumentStore::new(api.clone()), api)
    }

    #[tokio::test]
    async fn fetch_replaces_the_collection_wholesale() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(2, "beta"), doc(1, "alpha")];
        let (store, _) = store_with(api);

        store.select_document(Some(doc(5, "stale")));
        store.fetch_documents().await.unwrap();

        let titles: Vec<String> = store.documents().into_iter().map(|d| d.title).collect();
        // Server order is preserved as-is.
        assert_eq!(titles, vec!["beta", "alpha"]);
        assert!(!store.in_flight());
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn upload_prepends_and_returns_the_record() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "existing")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();

        let upload = DocumentUpload {
            title: "T".to_string(),
            file_name: "t.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        let created = store.upload_document(upload).await.unwrap();

        assert_eq!(created.title, "T");
        let documents = store.documents();
        assert_eq!(documents[0].id, created.id);
        assert_eq!(documents.len(), 2);
    }

    #[tokio::test]
    async fn upload_failure_leaves_the_collection_unchanged() {
        let (store, _) = store_with(FakeApi::failing());

        let upload = DocumentUpload {
            title: "T".to_string(),
            file_name: "t.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![],
        };
        let err = store.upload_document(upload).await.unwrap_err();

        assert!(matches!(err, PortError::Rejected(_)));
        assert!(store.documents().is_empty());
        assert_eq!(store.last_error().as_deref(), Some("backend said no"));
        assert!(!store.in_flight());
    }

    #[tokio::test]
    async fn rename_updates_list_and_selection_but_nothing_else() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "Old"), doc(2, "Other")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();
        store.select_document(Some(doc(1, "Old")));

        store.update_document(1, "New").await.unwrap();

        let documents = store.documents();
        assert_eq!(documents[0].title, "New");
        assert_eq!(documents[1].title, "Other");
        // Only the title moved; the rest of the record is untouched.
        assert_eq!(documents[0].file_name, "Old.pdf");
        assert_eq!(documents[0].file_size, 1024);

        let selected = store.selected().unwrap();
        assert_eq!(selected.id, 1);
        assert_eq!(selected.title, "New");
    }

    #[tokio::test]
    async fn rename_of_unselected_document_leaves_selection_alone() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "One"), doc(2, "Two")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();
        store.select_document(Some(doc(2, "Two")));

        store.update_document(1, "Renamed").await.unwrap();

        assert_eq!(store.selected().unwrap().title, "Two");
    }

    #[tokio::test]
    async fn delete_of_the_selected_document_clears_selection() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "One"), doc(2, "Two")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();
        store.select_document(Some(doc(1, "One")));

        store.delete_document(1).await.unwrap();

        assert!(store.selected().is_none());
        assert!(store.documents().iter().all(|d| d.id != 1));
    }

    #[tokio::test]
    async fn delete_of_another_document_keeps_selection() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "One"), doc(2, "Two")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();
        store.select_document(Some(doc(2, "Two")));

        store.delete_document(1).await.unwrap();

        assert_eq!(store.selected().unwrap().id, 2);
        assert_eq!(store.documents().len(), 1);
    }

    #[tokio::test]
    async fn select_is_purely_local() {
        let (store, api) = store_with(FakeApi::default());

        store.select_document(Some(doc(1, "One")));
        store.select_document(None);

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ask_question_returns_the_answer_without_touching_documents() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "One")];
        *api.answer.lock().unwrap() = Some("42".to_string());
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();

        let answer = store.ask_question(1, "what is it?").await.unwrap();

        assert_eq!(answer, "42");
        assert_eq!(store.documents().len(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_fatal_to_the_store() {
        let (store, _) = store_with(FakeApi::failing());

        assert!(store.fetch_documents().await.is_err());
        assert!(store.ask_question(1, "q").await.is_err());
        assert_eq!(store.last_error().as_deref(), Some("backend said no"));

        // The store remains usable for local operations afterwards.
        store.select_document(Some(doc(1, "One")));
        assert_eq!(store.selected().unwrap().id, 1);
    }

    #[tokio::test]
    async fn reset_empties_collection_and_selection() {
        let api = FakeApi::default();
        *api.listing.lock().unwrap() = vec![doc(1, "One")];
        let (store, _) = store_with(api);
        store.fetch_documents().await.unwrap();
        store.select_document(Some(doc(1, "One")));

        store.reset();

        assert!(store.documents().is_empty());
        assert!(store.selected().is_none());
        assert!(store.last_error().is_none());
    }
}
