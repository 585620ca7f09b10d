// Concurrent image uploads for the listing editor.
//
// All files of a batch upload at once and the batch settles only when every
// upload has settled. The batch commits all-or-nothing: one failed file fails
// the whole batch and none of its URLs reach the draft.

use std::cell::Cell;

use futures::future::join_all;

use crate::{
    draft::{IMAGE_LIMIT_NOTICE, ListingDraftStore},
    error::{ClientError, ClientResult},
    models::SelectedFile,
    storage::{ObjectStorage, ProgressReporter, ProgressWatch, object_name},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Uploading,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct UploadTask {
    pub file: SelectedFile,
    pub state: UploadState,
    pub result_url: Option<String>,
    pub error: Option<ClientError>,
    progress: ProgressReporter,
    // Position in which this task settled within its batch
    settled_seq: Option<usize>,
}

impl UploadTask {
    fn new(file: SelectedFile, progress: ProgressReporter) -> Self {
        Self {
            file,
            state: UploadState::Pending,
            result_url: None,
            error: None,
            progress,
            settled_seq: None,
        }
    }

    pub fn progress_ratio(&self) -> f64 {
        self.progress.current()
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, UploadState::Done | UploadState::Failed)
    }
}

/// Files accepted for upload, not started yet. Progress receivers can be
/// taken from here before the batch runs.
#[derive(Debug)]
pub struct UploadBatch {
    tasks: Vec<UploadTask>,
    watches: Vec<ProgressWatch>,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Progress receiver for the file at `index` (selection order).
    pub fn watch(&self, index: usize) -> Option<ProgressWatch> {
        self.watches.get(index).cloned()
    }
}

/// Every task of a batch, settled, in selection order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub tasks: Vec<UploadTask>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.tasks.iter().all(|task| task.state == UploadState::Done)
    }

    /// URLs in selection order if every task succeeded, otherwise the error
    /// of the task that failed first.
    pub fn into_result(self) -> ClientResult<Vec<String>> {
        let first_failure = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.state == UploadState::Failed)
            .min_by_key(|(_, task)| task.settled_seq.unwrap_or(usize::MAX))
            .map(|(index, _)| index);

        if let Some(index) = first_failure {
            let mut tasks = self.tasks;
            let task = tasks.swap_remove(index);
            return Err(task.error.unwrap_or_else(|| ClientError::Upload {
                file: task.file.name.clone(),
                reason: "upload failed".to_string(),
            }));
        }

        Ok(self
            .tasks
            .into_iter()
            .filter_map(|task| task.result_url)
            .collect())
    }
}

pub struct UploadOrchestrator<S> {
    storage: S,
    max_images: usize,
}

impl<S: ObjectStorage> UploadOrchestrator<S> {
    pub fn new(storage: S, max_images: usize) -> Self {
        Self { storage, max_images }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Accepts `files` for upload next to `existing` committed images.
    /// Bound violations are reported here, before any upload starts.
    pub fn prepare(&self, files: Vec<SelectedFile>, existing: usize) -> ClientResult<UploadBatch> {
        // An empty selection gets the same notice as an oversized one
        if files.is_empty() || files.len() + existing > self.max_images {
            tracing::warn!(
                selected = files.len(),
                existing,
                max = self.max_images,
                "Image selection outside limits"
            );
            return Err(ClientError::validation(IMAGE_LIMIT_NOTICE));
        }

        let (tasks, watches) = files
            .into_iter()
            .map(|file| {
                let (reporter, watch) = ProgressReporter::channel();
                (UploadTask::new(file, reporter), watch)
            })
            .unzip();
        Ok(UploadBatch { tasks, watches })
    }

    /// Runs every upload of `batch` concurrently and waits for all to settle.
    pub async fn execute(&self, batch: UploadBatch) -> BatchOutcome {
        let storage = &self.storage;
        let settle_counter = Cell::new(0usize);
        let counter = &settle_counter;
        tracing::info!(files = batch.len(), "Starting upload batch");

        let uploads = batch.tasks.into_iter().map(|mut task| async move {
            task.state = UploadState::Uploading;
            let name = object_name(&task.file);
            let result = storage.store(&name, &task.file, &task.progress).await;

            task.settled_seq = Some(counter.get());
            counter.set(counter.get() + 1);
            match result {
                Ok(url) => {
                    task.progress.report(1.0);
                    tracing::debug!(file = %task.file.name, %url, "Upload finished");
                    task.result_url = Some(url);
                    task.state = UploadState::Done;
                }
                Err(e) => {
                    tracing::warn!(file = %task.file.name, error = %e, "Upload failed");
                    task.error = Some(e);
                    task.state = UploadState::Failed;
                }
            }
            task
        });

        let tasks = join_all(uploads).await;
        let outcome = BatchOutcome { tasks };
        if outcome.succeeded() {
            tracing::info!(files = outcome.tasks.len(), "Upload batch complete");
        } else {
            tracing::error!("Upload batch failed; discarding its results");
        }
        outcome
    }

    /// Prepare and execute in one step, returning the batch URLs.
    pub async fn upload(
        &self,
        files: Vec<SelectedFile>,
        existing: usize,
    ) -> ClientResult<Vec<String>> {
        let batch = self.prepare(files, existing)?;
        self.execute(batch).await.into_result()
    }
}

/// Moves a settled batch's URLs into the draft. The store re-checks the image
/// limit, since another batch may have committed while this one ran.
pub fn commit(outcome: BatchOutcome, store: &mut ListingDraftStore) -> ClientResult<usize> {
    let urls = outcome.into_result()?;
    let count = urls.len();
    store.merge(urls)?;
    Ok(count)
}
