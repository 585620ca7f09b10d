// Create/update flow for one listing: loads the listing being edited, feeds
// uploaded images into the draft and submits it once it validates.

use crate::{
    draft::ListingDraftStore,
    error::{ClientError, ClientResult},
    listing_api::ListingApi,
    models::{Listing, ListingDraft, ListingSubmission, SelectedFile},
    notify::{Notice, Notifications},
    storage::ObjectStorage,
    upload::{self, BatchOutcome, UploadBatch, UploadOrchestrator},
};

pub const SUBMITTED_NOTICE: &str = "Listing successfully submitted!";
pub const SIGNED_OUT_NOTICE: &str = "You must be signed in to submit a listing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Update { listing_id: String },
}

pub struct ListingEditor<A, S> {
    api: A,
    orchestrator: UploadOrchestrator<S>,
    store: ListingDraftStore,
    mode: EditorMode,
    owner_ref: Option<String>,
    // Batches handed out by begin_upload and not finished yet
    uploads_in_flight: usize,
    notifications: Notifications,
}

impl<A: ListingApi, S: ObjectStorage> ListingEditor<A, S> {
    pub fn new(
        api: A,
        storage: S,
        mode: EditorMode,
        owner_ref: Option<String>,
        max_images: usize,
    ) -> Self {
        Self {
            api,
            orchestrator: UploadOrchestrator::new(storage, max_images),
            store: ListingDraftStore::new(max_images),
            mode,
            owner_ref,
            uploads_in_flight: 0,
            notifications: Notifications::default(),
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn draft(&self) -> &ListingDraft {
        self.store.draft()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads_in_flight > 0
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notifications.drain()
    }

    fn report<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            self.notifications.error(e.notice());
        }
        result
    }

    /// In update mode, fetches the listing and loads it into the draft.
    pub async fn load(&mut self) -> ClientResult<()> {
        let EditorMode::Update { listing_id } = &self.mode else {
            return Ok(());
        };
        tracing::info!(%listing_id, "Loading listing for edit");
        let result = self.api.fetch_listing(listing_id).await;
        let listing = self.report(result)?;
        let loaded = self.store.load(ListingDraft::from(listing));
        self.report(loaded)
    }

    /// Edits non-image fields of the draft.
    pub fn edit(&mut self, apply: impl FnOnce(&mut ListingDraft)) {
        self.store.edit(apply);
    }

    pub fn remove_image(&mut self, index: usize) -> ClientResult<String> {
        let result = self.store.remove(index);
        self.report(result)
    }

    /// Accepts `files` for upload and marks the editor as uploading. Take the
    /// per-file progress receivers from the batch before handing it to
    /// [`run_upload`](Self::run_upload).
    pub fn begin_upload(&mut self, files: Vec<SelectedFile>) -> ClientResult<UploadBatch> {
        let prepared = self.orchestrator.prepare(files, self.store.image_urls().len());
        let batch = self.report(prepared)?;
        self.uploads_in_flight += 1;
        Ok(batch)
    }

    /// Runs a batch from `begin_upload`. Only borrows the editor, so its
    /// state stays readable while the uploads are in flight.
    pub async fn run_upload(&self, batch: UploadBatch) -> BatchOutcome {
        self.orchestrator.execute(batch).await
    }

    /// Ends a batch: if every upload succeeded its URLs are appended to the
    /// draft, otherwise the draft is left as it was. Returns the number of
    /// images added.
    pub fn finish_upload(&mut self, outcome: BatchOutcome) -> ClientResult<usize> {
        self.uploads_in_flight = self.uploads_in_flight.saturating_sub(1);
        let committed = upload::commit(outcome, &mut self.store);
        self.report(committed)
    }

    /// `begin_upload`, `run_upload` and `finish_upload` in one call.
    pub async fn upload_images(&mut self, files: Vec<SelectedFile>) -> ClientResult<usize> {
        let batch = self.begin_upload(files)?;
        let outcome = self.run_upload(batch).await;
        self.finish_upload(outcome)
    }

    /// Validates the draft and sends it to the create or update endpoint.
    /// The returned listing's id is where the caller navigates next.
    pub async fn submit(&mut self) -> ClientResult<Listing> {
        let validated = self.store.validate_for_submit();
        self.report(validated)?;

        let Some(user_ref) = self.owner_ref.clone() else {
            return self.report(Err(ClientError::validation(SIGNED_OUT_NOTICE)));
        };
        let submission = ListingSubmission {
            draft: self.store.draft().clone(),
            user_ref,
        };

        let result = match &self.mode {
            EditorMode::Create => self.api.create_listing(&submission).await,
            EditorMode::Update { listing_id } => {
                self.api.update_listing(listing_id, &submission).await
            }
        };
        let listing = self.report(result)?;
        tracing::info!(id = %listing.id, "Listing submitted");
        self.notifications.success(SUBMITTED_NOTICE);
        Ok(listing)
    }
}
