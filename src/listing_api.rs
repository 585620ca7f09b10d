// Functions to interact with the listing API (search, fetch-for-edit, create, update)

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::{
    config::Settings,
    error::{ClientError, ClientResult},
    models::{ApiFailure, Listing, ListingPage, ListingSubmission},
};

/// Listing Query and Mutation API.
#[allow(async_fn_in_trait)]
pub trait ListingApi {
    /// `GET /api/listing/get?<query>`; an empty page is a valid result.
    async fn fetch_listings(&self, query: &str) -> ClientResult<ListingPage>;

    /// `GET /api/listing/get/{id}`.
    async fn fetch_listing(&self, id: &str) -> ClientResult<Listing>;

    async fn create_listing(&self, submission: &ListingSubmission) -> ClientResult<Listing>;

    async fn update_listing(
        &self,
        id: &str,
        submission: &ListingSubmission,
    ) -> ClientResult<Listing>;
}

pub struct HttpListingApi {
    client: Arc<Client>,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpListingApi {
    pub fn new(client: Arc<Client>, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/listing/{}", self.base_url, path)
    }

    // GET with retries on transport errors and 5xx; other statuses are returned as-is
    async fn get_with_retry(&self, url: &str) -> ClientResult<(StatusCode, Bytes)> {
        let mut retry_delay = self.retry_delay;
        let mut last_error = String::new();

        for attempt in 0..self.max_retries {
            tracing::debug!(url, attempt, "Fetch attempt {}/{}", attempt + 1, self.max_retries);

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() {
                        tracing::warn!(
                            url,
                            attempt,
                            status = %status,
                            "Server error encountered. Retrying..."
                        );
                        last_error = format!("server responded with {}", status);
                    } else {
                        match response.bytes().await {
                            Ok(body) => return Ok((status, body)),
                            Err(e) => {
                                tracing::warn!(
                                    url,
                                    attempt,
                                    error = %e,
                                    "Failed to read response bytes. Retrying..."
                                );
                                last_error = e.to_string();
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt,
                        error = %e,
                        "Network error during request. Retrying..."
                    );
                    last_error = e.to_string();
                }
            }

            if attempt + 1 < self.max_retries {
                sleep(retry_delay).await;
                retry_delay *= 2;
            }
        }

        Err(ClientError::Network(format!(
            "GET {} failed after {} attempts: {}",
            url, self.max_retries, last_error
        )))
    }

    async fn post_listing(
        &self,
        url: &str,
        submission: &ListingSubmission,
    ) -> ClientResult<Listing> {
        tracing::debug!(url, name = %submission.draft.name, "Submitting listing");
        let response = self.client.post(url).json(submission).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        parse_listing_body(status, &body, None)
    }
}

impl ListingApi for HttpListingApi {
    async fn fetch_listings(&self, query: &str) -> ClientResult<ListingPage> {
        let url = format!("{}?{}", self.url("get"), query);
        let (status, body) = self.get_with_retry(&url).await?;
        if !status.is_success() {
            return Err(ClientError::Network(format!("listing search responded with {}", status)));
        }
        let page: ListingPage = serde_json::from_slice(&body)?;
        tracing::debug!(url, received = page.len(), "Fetched listing page");
        Ok(page)
    }

    async fn fetch_listing(&self, id: &str) -> ClientResult<Listing> {
        let url = self.url(&format!("get/{}", id));
        let (status, body) = self.get_with_retry(&url).await?;
        parse_listing_body(status, &body, Some(id))
    }

    async fn create_listing(&self, submission: &ListingSubmission) -> ClientResult<Listing> {
        self.post_listing(&self.url("create"), submission).await
    }

    async fn update_listing(
        &self,
        id: &str,
        submission: &ListingSubmission,
    ) -> ClientResult<Listing> {
        self.post_listing(&self.url(&format!("update/{}", id)), submission).await
    }
}

/// Interprets a single-listing response. A 404 while fetching `requested_id`
/// is `NotFound`; `{ success: false }` bodies become `Api` errors carrying the
/// server's message.
pub fn parse_listing_body(
    status: StatusCode,
    body: &[u8],
    requested_id: Option<&str>,
) -> ClientResult<Listing> {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = requested_id {
            return Err(ClientError::NotFound(id.to_string()));
        }
    }

    let value: Value = serde_json::from_slice(body)?;
    if let Ok(failure) = serde_json::from_value::<ApiFailure>(value.clone()) {
        if !failure.success {
            if let Some(id) = requested_id {
                tracing::warn!(id, %status, message = ?failure.message, "Listing lookup failed");
            }
            return match (failure.message, requested_id) {
                (Some(message), _) => Err(ClientError::Api { message }),
                (None, Some(id)) => Err(ClientError::NotFound(id.to_string())),
                (None, None) => Err(ClientError::Api {
                    message: format!("request failed with {}", status),
                }),
            };
        }
    }

    if !status.is_success() {
        return Err(ClientError::Network(format!("listing API responded with {}", status)));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_body_parses_on_success() {
        let body = br#"{"_id":"abc","name":"Cabin","type":"rent","imageUrls":["u1"]}"#;
        let listing = parse_listing_body(StatusCode::OK, body, Some("abc")).unwrap();
        assert_eq!(listing.id, "abc");
        assert_eq!(listing.image_urls, vec!["u1".to_string()]);
    }

    #[test]
    fn failure_envelope_on_fetch_keeps_server_message() {
        let body = concat!(
            r#"{"success":false,"statusCode":401,"#,
            r#""message":"You can only view your own listings!"}"#
        )
        .as_bytes();
        let err = parse_listing_body(StatusCode::UNAUTHORIZED, body, Some("abc")).unwrap_err();
        assert_eq!(err.notice(), "You can only view your own listings!");
        assert!(matches!(err, ClientError::Api { .. }));
    }

    #[test]
    fn failure_envelope_without_message_on_fetch_is_not_found() {
        let body = br#"{"success":false}"#;
        let err = parse_listing_body(StatusCode::OK, body, Some("missing")).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn http_404_with_envelope_on_fetch_is_not_found() {
        let body = br#"{"success":false,"statusCode":404,"message":"Listing not found!"}"#;
        let err = parse_listing_body(StatusCode::NOT_FOUND, body, Some("gone")).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(id) if id == "gone"));
    }

    #[test]
    fn http_404_on_fetch_is_not_found() {
        let err = parse_listing_body(StatusCode::NOT_FOUND, b"", Some("gone")).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn failure_envelope_on_mutation_keeps_message() {
        let body = concat!(
            r#"{"success":false,"statusCode":401,"#,
            r#""message":"You can only update your own listings!"}"#
        )
        .as_bytes();
        let err = parse_listing_body(StatusCode::UNAUTHORIZED, body, None).unwrap_err();
        match err {
            ClientError::Api { message } => {
                assert_eq!(message, "You can only update your own listings!")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_body_is_a_network_error() {
        let err = parse_listing_body(StatusCode::OK, b"<html>", None).unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[test]
    fn urls_are_built_from_the_base() {
        let settings = Settings {
            api_base_url: "http://localhost:3000/".to_string(),
            ..Settings::default()
        };
        let api = HttpListingApi::new(Arc::new(Client::new()), &settings);
        assert_eq!(api.url("get"), "http://localhost:3000/api/listing/get");
        assert_eq!(api.url("update/7"), "http://localhost:3000/api/listing/update/7");
    }
}
