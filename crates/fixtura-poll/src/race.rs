//! Race several operations inside each attempt of one poll.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

use crate::error::BoxError;
use crate::operation::PollOperation;
use crate::spec::PollSpec;

/// Spec whose every attempt runs all `operations` concurrently and adopts the first `Some`.
///
/// An attempt where every operation yields `None` counts as "no result yet" and is retried
/// on the spec's interval. An operation failure before any `Some` fails the attempt. The
/// predicate defaults to [`Option::is_some`].
pub fn race_all<T, I>(operations: I) -> PollSpec<Option<T>>
where
    T: Send + 'static,
    I: IntoIterator<Item = PollOperation<Option<T>>>,
{
    let operations: Arc<[PollOperation<Option<T>>]> = operations.into_iter().collect();
    PollSpec::new(move || {
        let operations = Arc::clone(&operations);
        async move {
            let mut pending: FuturesUnordered<_> =
                operations.iter().map(PollOperation::attempt).collect();
            while let Some(outcome) = pending.next().await {
                if let Some(value) = outcome? {
                    return Ok(Some(value));
                }
            }
            Ok::<_, BoxError>(None)
        }
    })
    .until(Option::is_some)
}
