//! Ready-made specs for waiting on files and HTTP endpoints.

use std::path::PathBuf;

#[cfg(feature = "http")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "http")]
use tracing::debug;

use crate::spec::PollSpec;

/// Poll until something exists at `path`.
pub fn file_exists(path: impl Into<PathBuf>) -> PollSpec<bool> {
    let path = path.into();
    let message = format!("{} did not appear before the deadline", path.display());
    existence(path).until(|exists| *exists).with_message(message)
}

/// Poll until nothing exists at `path`.
pub fn file_absent(path: impl Into<PathBuf>) -> PollSpec<bool> {
    let path = path.into();
    let message = format!("{} was still present at the deadline", path.display());
    existence(path).until(|exists| !*exists).with_message(message)
}

fn existence(path: PathBuf) -> PollSpec<bool> {
    PollSpec::new(move || {
        let path = path.clone();
        async move { tokio::fs::try_exists(&path).await }
    })
}

/// Poll `url` with GET until it answers with `expected`.
///
/// Connection and timeout errors mean "no status yet" and are retried, so a server that is
/// still starting up does not fail the poll. Other transport errors fail it.
#[cfg(feature = "http")]
pub fn http_status(
    client: Client,
    url: impl Into<String>,
    expected: StatusCode,
) -> PollSpec<Option<StatusCode>> {
    let url = url.into();
    let message = format!("{url} did not answer {expected} before the deadline");
    PollSpec::new(move || {
        let request = client.get(url.as_str());
        let url = url.clone();
        async move {
            match request.send().await {
                Ok(response) => Ok(Some(response.status())),
                Err(error) if error.is_connect() || error.is_timeout() => {
                    debug!(url = %url, error = %error, "endpoint not reachable yet");
                    Ok(None)
                }
                Err(error) => Err(error),
            }
        }
    })
    .until(move |status| *status == Some(expected))
    .with_message(message)
}

/// [`http_status`] expecting `200 OK`.
#[cfg(feature = "http")]
pub fn http_ok(client: Client, url: impl Into<String>) -> PollSpec<Option<StatusCode>> {
    http_status(client, url, StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use fixtura_test_support::fixtures::{temp_workspace, write_file};
    use std::time::Duration;

    use crate::error::PollError;

    #[tokio::test]
    async fn file_exists_waits_for_late_file() -> Result<()> {
        let workspace = temp_workspace("probe-exists")?;
        let target = workspace.path().join("ready.flag");
        let spec = file_exists(&target)
            .with_interval(Duration::from_millis(10))
            .with_deadline(Duration::from_secs(5));

        let root = workspace.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            write_file(&root, "ready.flag", b"ok")
        });

        assert!(spec.execute().await?);
        writer.await??;
        Ok(())
    }

    #[tokio::test]
    async fn file_absent_times_out_with_path_in_message() -> Result<()> {
        let workspace = temp_workspace("probe-absent")?;
        let target = write_file(workspace.path(), "stuck.lock", b"held")?;
        let spec = file_absent(&target)
            .with_interval(Duration::from_millis(5))
            .with_deadline(Duration::from_millis(40));

        match spec.execute().await {
            Err(PollError::Timeout { message, .. }) => assert!(message.contains("stuck.lock")),
            other => bail!("expected a timeout, got {other:?}"),
        }
        Ok(())
    }
}
