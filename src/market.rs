//! Unauthenticated downloads from the public app market.

use std::io::Write;

use bytes::Bytes;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use reqwest::Response;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info};

use crate::client::{ClientError, OFFICIAL_DOMAIN, check_status};

const WRITE_QUEUE_DEPTH: usize = 8;

/// Client for the market download endpoint.
#[derive(Clone, Debug)]
pub struct MarketClient {
    http: reqwest::Client,
    domain: String,
}

impl MarketClient {
    /// Targets the market hosted at `domain`.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            domain: domain.trim().trim_end_matches('/').to_owned(),
        }
    }

    /// Targets the market hosted on the official VMS domain.
    #[must_use]
    pub fn official() -> Self {
        Self::new(OFFICIAL_DOMAIN)
    }

    /// Starts downloading `version` of the market project `project`.
    ///
    /// The body is not buffered; read it with [`MarketDownload::next_chunk`]
    /// or [`MarketDownload::write_to`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Remote`] for any status other than `200 OK` and
    /// [`ClientError::Transport`] when the request fails.
    pub async fn download(
        &self,
        project: &str,
        version: &str,
    ) -> Result<MarketDownload, ClientError> {
        let url = format!(
            "{}/market/api/apps/{}",
            self.domain,
            project.trim_start_matches('/')
        );
        debug!(%url, version, "downloading market app");
        let response = self
            .http
            .get(url)
            .query(&[("refs", version)])
            .send()
            .await?;
        Ok(MarketDownload {
            response: check_status(response)?,
        })
    }
}

/// Streaming body of a market download.
#[derive(Debug)]
pub struct MarketDownload {
    response: Response,
}

impl MarketDownload {
    /// Returns the advertised body length, if the server sent one.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Reads the next chunk of the body, or `None` once it is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the connection fails mid-body.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, ClientError> {
        Ok(self.response.chunk().await?)
    }

    /// Streams the body into `file_name` inside `dir`, replacing any existing
    /// file, and returns the number of bytes written.
    ///
    /// Chunks are handed to a blocking task that owns the file, so disk
    /// writes never run on the async worker.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the file cannot be written and
    /// [`ClientError::Transport`] when the body cannot be read.
    pub async fn write_to(mut self, dir: &Utf8Path, file_name: &str) -> Result<u64, ClientError> {
        let target = dir.join(file_name);
        let io_error = |message: String| ClientError::Io {
            path: target.to_string(),
            message,
        };

        let (sender, mut receiver) = mpsc::channel::<Bytes>(WRITE_QUEUE_DEPTH);
        let writer = {
            let dir = dir.to_owned();
            let file_name = file_name.to_owned();
            task::spawn_blocking(move || write_chunks(&dir, &file_name, &mut receiver))
        };

        let streamed = async {
            while let Some(chunk) = self.next_chunk().await? {
                // A closed channel means the writer failed; its error wins below.
                if sender.send(chunk).await.is_err() {
                    break;
                }
            }
            Ok::<(), ClientError>(())
        }
        .await;
        drop(sender);

        let written = writer
            .await
            .map_err(|err| io_error(err.to_string()))?
            .map_err(|err| io_error(err.to_string()))?;
        streamed?;

        info!(path = %target, bytes = written, "market app saved");
        Ok(written)
    }
}

fn write_chunks(
    dir: &Utf8Path,
    file_name: &str,
    receiver: &mut mpsc::Receiver<Bytes>,
) -> std::io::Result<u64> {
    let handle = Dir::open_ambient_dir(dir, ambient_authority())?;
    let mut file = handle.create(file_name)?;
    let mut written: u64 = 0;
    while let Some(chunk) = receiver.blocking_recv() {
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    file.flush()?;
    Ok(written)
}
