//! Review session for one open document
//!
//! Mutations update the in-memory store first and then write the full list
//! through the storage. A failed write is reported in the returned
//! [`Mutation`]; the in-memory change stays and nothing is retried.
//! Nothing is written while no result has been loaded, so a result file
//! that failed to load is never replaced by an empty list.

use crate::error::{Result, ReviewError};
use crate::overlay::PageOverlay;
use crate::status::{next_problem_page, ReviewStats};
use crate::storage::ResultStorage;
use crate::store::IssueStore;
use markup_core::AnnotatedDocument;
use shared_types::{GuideConfig, IssueId, PageSize, PageStatus};

/// Result of a mutation: the new value plus the outcome of persisting it
#[derive(Debug)]
#[must_use]
pub struct Mutation<T> {
    pub value: T,
    pub persisted: Result<()>,
}

impl<T> Mutation<T> {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproveOutcome {
    /// Issues resolved by this call
    pub resolved: usize,
    /// Page to show next, if the current one is not the last
    pub next_page: Option<u32>,
}

pub struct ReviewSession<S: ResultStorage> {
    storage: S,
    store: IssueStore,
    /// Whether a usable result was loaded at open time
    has_result: bool,
    page_size: PageSize,
    page_count: u32,
}

impl<S: ResultStorage> ReviewSession<S> {
    /// Open a session, loading whatever result the storage holds.
    ///
    /// A missing, unreadable or malformed result gives an empty issue set.
    pub async fn open(storage: S) -> Self {
        let (store, has_result) = match storage.read_result().await {
            Ok(Some(json)) => match IssueStore::from_json(&json) {
                Ok(store) => (store, true),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored result is malformed, starting empty");
                    (IssueStore::default(), false)
                }
            },
            Ok(None) => {
                tracing::debug!("No stored result yet");
                (IssueStore::default(), false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored result, starting empty");
                (IssueStore::default(), false)
            }
        };

        Self {
            storage,
            store,
            has_result,
            page_size: PageSize::default(),
            page_count: 0,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    pub fn has_result(&self) -> bool {
        self.has_result
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Record the page geometry once the first page has been measured.
    ///
    /// Later calls are ignored; an unmeasured size is never recorded.
    pub fn set_geometry(&mut self, size: PageSize, page_count: u32) {
        if self.page_size.is_measured() || !size.is_measured() {
            return;
        }
        self.page_size = size;
        self.page_count = page_count;
    }

    /// Measure the stored document's first page.
    ///
    /// Returns the unmeasured size when there is no readable document.
    pub async fn measure(&mut self) -> PageSize {
        if self.page_size.is_measured() {
            return self.page_size;
        }
        let bytes = match self.storage.read_document().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return self.page_size,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read document");
                return self.page_size;
            }
        };
        match (markup_core::page_size(&bytes, 1), markup_core::page_count(&bytes)) {
            (Ok(size), Ok(count)) => self.set_geometry(size, count),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to measure document");
            }
        }
        self.page_size
    }

    /// Replace the issue set wholesale, as after a fresh backend check
    pub async fn replace(&mut self, store: IssueStore) -> Result<()> {
        self.store = store;
        self.has_result = true;
        self.persist().await
    }

    /// Write the full list to storage
    pub async fn persist(&self) -> Result<()> {
        if !self.has_result {
            tracing::warn!("No issue result loaded, leaving stored result untouched");
            return Err(ReviewError::Persistence(
                "no issue result loaded".to_string(),
            ));
        }
        let json = serde_json::to_string_pretty(&self.store.to_result_value())
            .map_err(|e| ReviewError::Persistence(e.to_string()))?;
        match self.storage.write_result(&json).await {
            Ok(()) => {
                tracing::debug!(count = self.store.len(), "Persisted review state");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist review state");
                Err(ReviewError::Persistence(e.to_string()))
            }
        }
    }

    async fn commit<T>(&self, value: T) -> Mutation<T> {
        Mutation {
            value,
            persisted: self.persist().await,
        }
    }

    /// A mutation that changed nothing and so writes nothing
    fn unchanged<T>(value: T) -> Mutation<T> {
        Mutation {
            value,
            persisted: Ok(()),
        }
    }

    /// Flip one issue; unknown ids fail before anything is written
    pub async fn toggle_issue(&mut self, id: IssueId) -> Result<Mutation<bool>> {
        let is_ignored = self.store.toggle(id)?;
        Ok(self.commit(is_ignored).await)
    }

    pub async fn set_page_resolution(&mut self, page: u32, resolved: bool) -> Mutation<usize> {
        let count = self.store.set_page_resolution(page, resolved);
        if count == 0 {
            return Self::unchanged(count);
        }
        self.commit(count).await
    }

    /// Resolve the page if anything is active on it, otherwise reopen it
    pub async fn toggle_page(&mut self, page: u32) -> Mutation<Option<bool>> {
        match self.store.toggle_page(page) {
            Some(state) => self.commit(Some(state)).await,
            None => Self::unchanged(None),
        }
    }

    /// Resolve everything active on `page` and move to the following page
    pub async fn approve_and_next(&mut self, page: u32) -> Mutation<ApproveOutcome> {
        let resolved = self.store.approve_page(page);
        let next_page = (page < self.page_count).then_some(page + 1);
        let outcome = ApproveOutcome {
            resolved,
            next_page,
        };
        if resolved == 0 {
            return Self::unchanged(outcome);
        }
        self.commit(outcome).await
    }

    pub fn page_status(&self, page: u32) -> PageStatus {
        self.store.page_status(page)
    }

    /// Next page needing attention after `page`; `None` means review complete
    pub fn next_problem_page(&self, page: u32) -> Option<u32> {
        next_problem_page(self.store.issues(), page, self.page_count)
    }

    pub fn stats(&self) -> ReviewStats {
        self.store.stats()
    }

    pub fn overlay(&self, page: u32, guides: Option<&GuideConfig>) -> PageOverlay {
        PageOverlay::build(self.store.issues(), page, self.page_size, guides)
    }

    /// Burn the active issues into a copy of the document.
    ///
    /// Fails with `ExportPrecondition` before drawing when the document or
    /// the result data is missing.
    pub async fn export_annotated(&self) -> Result<AnnotatedDocument> {
        if !self.has_result {
            return Err(ReviewError::ExportPrecondition(
                "no issue result loaded".to_string(),
            ));
        }
        let document = self
            .storage
            .read_document()
            .await
            .map_err(|e| ReviewError::ExportPrecondition(format!("document unreadable: {}", e)))?
            .ok_or_else(|| ReviewError::ExportPrecondition("no document".to_string()))?;

        tracing::info!(issues = self.store.len(), "Exporting annotated document");
        let annotated = markup_core::annotate_document(&document, self.store.issues())?;
        tracing::info!(
            drawn = annotated.drawn,
            off_page = annotated.off_page.len(),
            draw_errors = annotated.draw_errors.len(),
            "Export finished"
        );
        Ok(annotated)
    }
}
