//! Cursor-following fetch for a single stream.

use std::sync::Arc;

use monwatch_adapters::{MonitorApi, PageParams, PageResponse};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::PagedRecord;
use crate::config::NonSuccessPolicy;
use crate::FetchError;

/// Drives repeated page fetches against one endpoint.
///
/// Pagination ends when a page carries no cursor, when `max_pages` pages
/// have been fetched, or when a non-success page is soft-stopped. Any hard
/// failure fails the whole stream; partial results are never returned
/// alongside an error.
#[derive(Clone)]
pub struct Paginator {
    api: Arc<dyn MonitorApi>,
    max_pages: usize,
    policy: NonSuccessPolicy,
}

impl Paginator {
    pub fn new(api: Arc<dyn MonitorApi>, max_pages: usize, policy: NonSuccessPolicy) -> Self {
        Self {
            api,
            max_pages,
            policy,
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Fetch every page for `params`, in page order.
    pub async fn fetch_all_pages<R: PagedRecord>(
        &self,
        mut params: PageParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>, FetchError> {
        let mut records = Vec::new();

        for page_number in 1..=self.max_pages {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                response = R::fetch_page(self.api.as_ref(), &params) => response?,
            };

            match response {
                PageResponse::Page(page) => {
                    debug!(
                        kind = R::KIND,
                        page = page_number,
                        entries = page.entries.len(),
                        more = page.next_cursor.is_some(),
                        "Fetched page"
                    );
                    records.extend(page.entries);

                    match page.next_cursor {
                        Some(cursor) => params.cursor = Some(cursor),
                        None => return Ok(records),
                    }
                }
                PageResponse::NonSuccess { status, body } => match self.policy {
                    NonSuccessPolicy::SoftStop => {
                        warn!(
                            kind = R::KIND,
                            page = page_number,
                            status,
                            body = %body,
                            "Non-success status, keeping pages fetched so far"
                        );
                        return Ok(records);
                    }
                    NonSuccessPolicy::Fail => return Err(FetchError::Rejected { status, body }),
                },
            }
        }

        warn!(
            kind = R::KIND,
            max_pages = self.max_pages,
            "Page limit reached with a cursor still pending"
        );
        Ok(records)
    }
}
