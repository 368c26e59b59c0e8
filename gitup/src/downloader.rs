use crate::error::{Error, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, Response,
};
use std::{fs::File, io::Write, path::Path};
use url::Url;

/// A download progress callback, invoked with percentage values from 0 to
/// 100. Values are monotonically non-decreasing for a single download.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// The transport used for all network access.
///
/// The default implementation is [`HttpDownloader`]. Implementations must
/// propagate transport failures (connection errors, non-success statuses)
/// unmodified; no retrying belongs at this layer.
#[async_trait]
pub trait Downloader: std::fmt::Debug + Send + Sync {
    /// Fetches a URL and returns the response body as text.
    async fn download_string(&self, url: &Url, auth: Option<&HeaderValue>) -> Result<String>;

    /// Fetches a URL with the given `Accept` header and returns the raw
    /// response body.
    async fn download_bytes(
        &self,
        url: &Url,
        auth: Option<&HeaderValue>,
        accept: &str,
    ) -> Result<Vec<u8>>;

    /// Streams a URL to a local file, reporting progress as bytes arrive.
    ///
    /// The destination is created or overwritten. On failure any partial
    /// output is left in place for the caller to clean up.
    async fn download_file(
        &self,
        url: &Url,
        dest: &Path,
        progress: Option<&ProgressFn>,
        auth: Option<&HeaderValue>,
        accept: &str,
    ) -> Result<()>;
}

/// The standard [`Downloader`] over a reqwest client.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader with a client configured the way this crate
    /// expects (gzip transport compression and a versioned user agent).
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gitup version {}", crate::VERSION))?,
        );
        let client = Client::builder().gzip(true).default_headers(headers).build()?;
        Ok(Self { client })
    }

    /// Creates a downloader from an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &Url, auth: Option<&HeaderValue>, accept: &str) -> Result<Response> {
        let mut req_builder = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_str(accept)?);
        if let Some(auth) = auth {
            req_builder = req_builder.header(AUTHORIZATION, auth.clone());
        }

        let resp = self.client.execute(req_builder.build()?).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus {
                url: url.clone(),
                status,
                body,
            });
        }

        Ok(resp)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download_string(&self, url: &Url, auth: Option<&HeaderValue>) -> Result<String> {
        debug!("Downloading text from `{url}`");
        Ok(self.get(url, auth, "application/json").await?.text().await?)
    }

    async fn download_bytes(
        &self,
        url: &Url,
        auth: Option<&HeaderValue>,
        accept: &str,
    ) -> Result<Vec<u8>> {
        debug!("Downloading bytes from `{url}`");
        Ok(self.get(url, auth, accept).await?.bytes().await?.to_vec())
    }

    async fn download_file(
        &self,
        url: &Url,
        dest: &Path,
        progress: Option<&ProgressFn>,
        auth: Option<&HeaderValue>,
        accept: &str,
    ) -> Result<()> {
        debug!("Downloading `{url}` to `{}`", dest.display());
        let mut resp = self.get(url, auth, accept).await?;
        let total = resp.content_length().filter(|t| *t > 0);

        let write_err = |source| Error::DownloadWrite {
            path: dest.display().to_string(),
            source,
        };

        let mut file = File::create(dest).map_err(write_err)?;
        let mut received: u64 = 0;
        let mut last_pct: u8 = 0;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(chunk.as_ref()).map_err(write_err)?;
            received += chunk.len() as u64;
            if let (Some(progress), Some(total)) = (progress, total) {
                // Only report when the integer percentage advances, so the
                // callback never turns into a per-chunk hot path that stalls
                // the read loop.
                let pct = ((received * 100) / total).min(100) as u8;
                if pct > last_pct {
                    last_pct = pct;
                    progress(pct);
                }
            }
        }

        if let Some(progress) = progress {
            if last_pct < 100 {
                progress(100);
            }
        }

        Ok(())
    }
}
