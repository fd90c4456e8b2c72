//! Concurrent fan-out over several paginated streams.

use monwatch_adapters::PageParams;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn, Instrument};

use super::{PagedRecord, Paginator};
use crate::FetchError;

/// Runs one [`Paginator`] task per parameter variant.
///
/// Each task owns the result slot at its stream index, so merging needs no
/// locking. The first hard failure cancels every sibling and is returned on
/// its own. Success yields all streams concatenated in variant order.
#[derive(Clone)]
pub struct FetchCoordinator {
    paginator: Paginator,
}

impl FetchCoordinator {
    pub fn new(paginator: Paginator) -> Self {
        Self { paginator }
    }

    pub async fn fetch_all<R: PagedRecord>(
        &self,
        variants: Vec<PageParams>,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>, FetchError> {
        let scope = cancel.child_token();
        let mut slots: Vec<Option<Vec<R>>> = variants.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, params) in variants.into_iter().enumerate() {
            let paginator = self.paginator.clone();
            let token = scope.clone();
            let span = debug_span!("stream", kind = R::KIND, index, shared = params.only_shared);
            tasks.spawn(
                async move {
                    let result = paginator.fetch_all_pages::<R>(params, &token).await;
                    (index, result)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            let err = match joined {
                Ok((index, Ok(records))) => {
                    debug!(kind = R::KIND, stream = index, records = records.len(), "Stream complete");
                    slots[index] = Some(records);
                    continue;
                }
                Ok((index, Err(err))) => {
                    warn!(kind = R::KIND, stream = index, error = %err, "Stream failed, cancelling siblings");
                    err
                }
                Err(join_err) => FetchError::Task(join_err.to_string()),
            };

            scope.cancel();
            tasks.abort_all();
            return Err(err);
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }
}
