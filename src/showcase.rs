// Landing-page showcase: recent offers, rentals and sales, fetched concurrently

use crate::{
    error::ClientResult,
    filter_codec::LIMIT_KEY,
    listing_api::ListingApi,
    models::ListingPage,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Showcase {
    pub offer: ListingPage,
    pub rent: ListingPage,
    pub sale: ListingPage,
}

/// Runs the three showcase queries at once; any failure fails the showcase.
pub async fn fetch_showcase<A: ListingApi>(api: &A, limit: usize) -> ClientResult<Showcase> {
    let offer_query = format!("offer=true&{}={}", LIMIT_KEY, limit);
    let rent_query = format!("type=rent&{}={}", LIMIT_KEY, limit);
    let sale_query = format!("type=sale&{}={}", LIMIT_KEY, limit);

    let (offer, rent, sale) = futures::try_join!(
        api.fetch_listings(&offer_query),
        api.fetch_listings(&rent_query),
        api.fetch_listings(&sale_query)
    )?;

    tracing::info!(
        offers = offer.len(),
        rentals = rent.len(),
        sales = sale.len(),
        "Showcase loaded"
    );
    Ok(Showcase { offer, rent, sale })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::ClientError;
    use crate::models::{Listing, ListingSubmission};

    #[derive(Default)]
    struct FakeApi {
        fail_sales: bool,
        queries: RefCell<Vec<String>>,
    }

    impl ListingApi for FakeApi {
        async fn fetch_listings(&self, query: &str) -> ClientResult<ListingPage> {
            self.queries.borrow_mut().push(query.to_string());
            if self.fail_sales && query.starts_with("type=sale") {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            Ok(vec![Listing {
                id: query.to_string(),
                ..Default::default()
            }])
        }

        async fn fetch_listing(&self, id: &str) -> ClientResult<Listing> {
            Err(ClientError::NotFound(id.to_string()))
        }

        async fn create_listing(&self, _: &ListingSubmission) -> ClientResult<Listing> {
            unimplemented!()
        }

        async fn update_listing(&self, _: &str, _: &ListingSubmission) -> ClientResult<Listing> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn showcase_issues_three_limited_queries() {
        let api = FakeApi::default();
        let showcase = fetch_showcase(&api, 4).await.unwrap();
        assert_eq!(showcase.offer[0].id, "offer=true&limit=4");
        assert_eq!(showcase.rent[0].id, "type=rent&limit=4");
        assert_eq!(showcase.sale[0].id, "type=sale&limit=4");
        assert_eq!(api.queries.borrow().len(), 3);
    }

    #[tokio::test]
    async fn one_failed_query_fails_the_showcase() {
        let api = FakeApi {
            fail_sales: true,
            ..Default::default()
        };
        assert!(fetch_showcase(&api, 4).await.is_err());
    }
}
