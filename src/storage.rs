// Object-storage upload backend: one file per call, progress reported while the
// body streams, resolving to the durable URL of the stored object.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::{Body, Client, header::CONTENT_TYPE};
use serde::Deserialize;
use tokio::sync::watch;

use crate::{
    config::Settings,
    error::{ClientError, ClientResult},
    models::SelectedFile,
};

const CHUNK_SIZE: usize = 64 * 1024;

/// Write half of a per-file progress channel. Reported ratios are clamped to
/// `[0, 1]` and never move backwards.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<f64>>,
}

/// Read half handed to the UI; sample with `*progress.borrow()`.
pub type ProgressWatch = watch::Receiver<f64>;

impl ProgressReporter {
    pub fn channel() -> (ProgressReporter, ProgressWatch) {
        let (tx, rx) = watch::channel(0.0);
        (ProgressReporter { tx: Arc::new(tx) }, rx)
    }

    pub fn report(&self, ratio: f64) {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        self.tx.send_if_modified(|current| {
            if ratio > *current {
                *current = ratio;
                true
            } else {
                false
            }
        });
    }

    pub fn current(&self) -> f64 {
        *self.tx.borrow()
    }
}

/// Name under which a selected file is stored: `<epoch-millis>_<file name>`.
pub fn object_name(file: &SelectedFile) -> String {
    format!("{}_{}", Utc::now().timestamp_millis(), file.name)
}

#[allow(async_fn_in_trait)]
pub trait ObjectStorage {
    /// Stores `file` as `object_name` and returns its durable URL.
    async fn store(
        &self,
        object_name: &str,
        file: &SelectedFile,
        progress: &ProgressReporter,
    ) -> ClientResult<String>;
}

#[derive(Debug, Deserialize)]
struct StoredObject {
    url: String,
}

pub struct HttpObjectStorage {
    client: Arc<Client>,
    endpoint: String,
}

impl HttpObjectStorage {
    pub fn new(client: Arc<Client>, settings: &Settings) -> Self {
        Self {
            client,
            endpoint: settings.storage_base_url.clone(),
        }
    }
}

// Splits the payload into chunks and reports progress as each one is handed to the transport
fn progress_chunks(
    data: Bytes,
    progress: ProgressReporter,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = data.len().max(1) as f64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect();

    let mut sent = 0usize;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        progress.report(sent as f64 / total);
        Ok(chunk)
    })
}

impl ObjectStorage for HttpObjectStorage {
    async fn store(
        &self,
        object_name: &str,
        file: &SelectedFile,
        progress: &ProgressReporter,
    ) -> ClientResult<String> {
        let upload_error = |reason: String| ClientError::Upload {
            file: file.name.clone(),
            reason,
        };

        tracing::debug!(object_name, size = file.size(), "Uploading object");
        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[("name", object_name)])
            .body(Body::wrap_stream(progress_chunks(file.data.clone(), progress.clone())));
        if let Some(content_type) = &file.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        let response = request.send().await.map_err(|e| upload_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                object_name,
                status = %status,
                response_body = body,
                "Storage rejected upload"
            );
            return Err(upload_error(format!("storage responded with {}", status)));
        }

        let stored: StoredObject = response
            .json()
            .await
            .map_err(|e| upload_error(format!("invalid storage response: {}", e)))?;
        progress.report(1.0);
        Ok(stored.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let (reporter, watch) = ProgressReporter::channel();
        reporter.report(0.4);
        reporter.report(0.2);
        assert_eq!(*watch.borrow(), 0.4);
        reporter.report(7.0);
        assert_eq!(*watch.borrow(), 1.0);
        reporter.report(f64::NAN);
        assert_eq!(reporter.current(), 1.0);
    }

    #[test]
    fn object_name_keeps_file_name_suffix() {
        let file = SelectedFile::new("porch.png", vec![1u8, 2, 3]);
        let name = object_name(&file);
        let (millis, rest) = name.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "porch.png");
    }

    #[tokio::test]
    async fn chunk_stream_reports_full_transfer() {
        let (reporter, watch) = ProgressReporter::channel();
        let data = Bytes::from(vec![0u8; CHUNK_SIZE * 2 + 10]);
        let chunks: Vec<_> = progress_chunks(data, reporter).collect().await;

        assert_eq!(chunks.len(), 3);
        let received: usize = chunks.iter().map(|c| c.as_ref().unwrap().len()).sum();
        assert_eq!(received, CHUNK_SIZE * 2 + 10);
        assert_eq!(*watch.borrow(), 1.0);
    }
}
