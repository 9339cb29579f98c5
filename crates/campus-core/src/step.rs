use std::{future::Future, time::Duration};

use crate::{Error, Result};

/// Await `fut`, giving up after `limit`.
///
/// The outer `Result` carries the timeout; the inner one is the store's own
/// outcome, left for the caller to classify.
pub(crate) async fn bounded<T, E, F>(
  step:  &str,
  limit: Duration,
  fut:   F,
) -> Result<std::result::Result<T, E>>
where
  F: Future<Output = std::result::Result<T, E>>,
{
  tokio::time::timeout(limit, fut)
    .await
    .map_err(|_| Error::Timeout { step: step.to_owned(), after: limit })
}
