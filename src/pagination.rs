// Offset cursor for incremental "load more" fetches.
//
// The offset is the number of materialized items, not a server token, so an
// insert or delete on the server between pages can shift results by a few
// rows. That staleness window is accepted.

/// `true` when a page of `received` items means more may follow.
///
/// Every page request asks for `page_size + 1` rows, so receiving more than
/// `page_size` proves at least one further row existed at request time.
pub fn has_more_after(received: usize, page_size: usize) -> bool {
    received > page_size
}

#[derive(Debug, Clone)]
pub struct PaginationCursor {
    page_size: usize,
    has_more: bool,
    in_flight: bool,
}

impl PaginationCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            has_more: false,
            in_flight: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of rows to request per page.
    pub fn request_limit(&self) -> usize {
        self.page_size + 1
    }

    /// Offset of the next page: exactly the count currently materialized.
    pub fn next(&self, current_count: usize) -> usize {
        current_count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a "load more" may start now.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.in_flight
    }

    /// Forget all paging state; used when a new filter is committed.
    pub fn reset(&mut self) {
        self.has_more = false;
        self.in_flight = false;
    }

    /// Marks a "load more" as started and returns its offset, or `None`
    /// while another page fetch is running or nothing more is available.
    pub fn begin(&mut self, current_count: usize) -> Option<usize> {
        if !self.can_load_more() {
            return None;
        }
        self.in_flight = true;
        Some(self.next(current_count))
    }

    /// Recomputes `has_more` from a settled page (first or appended).
    pub fn record_page(&mut self, received: usize) {
        self.in_flight = false;
        self.has_more = has_more_after(received, self.page_size);
    }

    /// A page fetch failed: allow a retry, keep the previous `has_more`.
    pub fn record_failure(&mut self) {
        self.in_flight = false;
    }
}
