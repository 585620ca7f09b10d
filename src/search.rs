// Search state engine: owns the committed filter, the local draft, the loaded
// listings and the paging cursor.
//
// Every request carries the epoch it was issued under. Committing a new filter
// bumps the epoch, and responses from an older epoch are dropped on arrival.

use crate::{
    error::ClientResult,
    filter_codec,
    listing_api::ListingApi,
    models::{Listing, ListingPage, SearchFilter, SortChoice, TypeFilter},
    notify::{Notice, Notifications},
    pagination::PaginationCursor,
};

pub const NO_LISTINGS_NOTICE: &str = "No listings found!";
pub const FETCH_FAILED_NOTICE: &str = "Failed to fetch listings.";
pub const FETCH_MORE_FAILED_NOTICE: &str = "Failed to fetch more listings.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Loaded,
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    First,
    More { offset: usize },
}

/// One page fetch issued by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub epoch: u64,
    pub kind: PageKind,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Applied,
    /// The response belonged to a superseded filter and was discarded.
    Stale,
}

pub struct SearchController<A> {
    api: A,
    filter: SearchFilter,
    draft: SearchFilter,
    listings: Vec<Listing>,
    status: SearchStatus,
    cursor: PaginationCursor,
    epoch: u64,
    notifications: Notifications,
}

impl<A: ListingApi> SearchController<A> {
    pub fn new(api: A, page_size: usize) -> Self {
        Self {
            api,
            filter: SearchFilter::default(),
            draft: SearchFilter::default(),
            listings: Vec::new(),
            status: SearchStatus::Idle,
            cursor: PaginationCursor::new(page_size),
            epoch: 0,
            notifications: Notifications::default(),
        }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn draft(&self) -> &SearchFilter {
        &self.draft
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    /// Whether the "show more" action is currently enabled.
    pub fn can_load_more(&self) -> bool {
        self.status != SearchStatus::Loading && self.cursor.can_load_more()
    }

    /// Query string for the committed filter, as it should appear in the URL.
    pub fn location_query(&self) -> String {
        filter_codec::encode(&self.filter)
    }

    pub fn notices(&self) -> &[Notice] {
        self.notifications.pending()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notifications.drain()
    }

    // --- Draft edits (no effect until submit) ---

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.draft.search_term = term.into();
    }

    pub fn set_type(&mut self, listing_type: TypeFilter) {
        self.draft.listing_type = listing_type;
    }

    pub fn set_parking(&mut self, parking: bool) {
        self.draft.parking = parking;
    }

    pub fn set_furnished(&mut self, furnished: bool) {
        self.draft.furnished = furnished;
    }

    pub fn set_offer(&mut self, offer: bool) {
        self.draft.offer = offer;
    }

    /// Applies the combined sort select value, e.g. `regularPrice_asc`.
    pub fn set_sort_choice(&mut self, value: &str) {
        self.draft.set_sort_choice(SortChoice::parse(value));
    }

    /// Form submission: returns the query string to navigate to. The new
    /// filter takes effect once the location change comes back through
    /// [`SearchController::begin_location_change`].
    pub fn submit(&self) -> String {
        let query = filter_codec::encode(&self.draft);
        tracing::info!(%query, "Search submitted");
        query
    }

    // --- Two-phase page requests ---

    /// Location changed (or first mount): decode the URL, commit the filter,
    /// supersede anything in flight and request page one.
    pub fn begin_location_change(&mut self, query: &str) -> PageRequest {
        self.filter = filter_codec::decode_filter(query);
        self.draft = self.filter.clone();
        self.epoch += 1;
        self.status = SearchStatus::Loading;
        self.cursor.reset();

        let request = PageRequest {
            epoch: self.epoch,
            kind: PageKind::First,
            query: filter_codec::fetch_query(&self.filter, None, self.cursor.request_limit()),
        };
        tracing::debug!(epoch = self.epoch, query = %request.query, "Loading first page");
        request
    }

    /// Starts a "load more" for the committed filter. `None` while a page
    /// fetch is in flight or when the last page said nothing more exists.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.status == SearchStatus::Loading {
            return None;
        }
        let offset = self.cursor.begin(self.listings.len())?;
        let request = PageRequest {
            epoch: self.epoch,
            kind: PageKind::More { offset },
            query: filter_codec::fetch_query(
                &self.filter,
                Some(offset),
                self.cursor.request_limit(),
            ),
        };
        tracing::debug!(epoch = self.epoch, offset, "Loading more listings");
        Some(request)
    }

    /// Applies a settled page fetch. Failures keep the listings already shown.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        result: ClientResult<ListingPage>,
    ) -> PageOutcome {
        if request.epoch != self.epoch {
            tracing::debug!(
                request_epoch = request.epoch,
                current_epoch = self.epoch,
                "Discarding stale listing page"
            );
            return PageOutcome::Stale;
        }

        match (request.kind, result) {
            (PageKind::First, Ok(page)) => {
                self.cursor.record_page(page.len());
                self.status = if page.is_empty() {
                    self.notifications.info(NO_LISTINGS_NOTICE);
                    SearchStatus::Empty
                } else {
                    SearchStatus::Loaded
                };
                tracing::info!(
                    received = page.len(),
                    has_more = self.cursor.has_more(),
                    "First page loaded"
                );
                self.listings = page;
            }
            (PageKind::More { offset }, Ok(page)) => {
                self.cursor.record_page(page.len());
                tracing::info!(
                    offset,
                    received = page.len(),
                    has_more = self.cursor.has_more(),
                    "Appended page"
                );
                self.listings.extend(page);
                self.status = SearchStatus::Loaded;
            }
            (kind, Err(e)) => {
                tracing::error!(?kind, error = %e, "Listing fetch failed");
                self.cursor.record_failure();
                self.status = SearchStatus::Failed;
                let notice = match kind {
                    PageKind::First => FETCH_FAILED_NOTICE,
                    PageKind::More { .. } => FETCH_MORE_FAILED_NOTICE,
                };
                self.notifications.error(notice);
            }
        }
        PageOutcome::Applied
    }

    // --- One-shot helpers ---

    pub async fn on_location_change(&mut self, query: &str) -> PageOutcome {
        let request = self.begin_location_change(query);
        let result = self.api.fetch_listings(&request.query).await;
        self.apply(&request, result)
    }

    pub async fn load_more(&mut self) -> Option<PageOutcome> {
        let request = self.begin_load_more()?;
        let result = self.api.fetch_listings(&request.query).await;
        Some(self.apply(&request, result))
    }
}
