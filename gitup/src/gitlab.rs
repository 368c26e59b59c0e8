use crate::{
    assets::resolve_asset_url,
    auth::auth_header,
    downloader::{Downloader, ProgressFn},
    error::{Error, Result},
    manifest::{EntryParser, UpdateEntry},
    release::Release,
    source::UpdateSource,
};
use async_trait::async_trait;
use log::debug;
use std::{path::Path, sync::LazyLock};
use url::Url;

/// The canonical GitLab host. Releases API requests go to this host unless
/// an explicit API base URL is configured; the configured repository URL
/// contributes only its path.
pub(crate) static DEFAULT_API_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://gitlab.com").expect("could not parse canonical host URL"));

/// The name of the manifest asset that enumerates a release's update entries.
pub const MANIFEST_ASSET_NAME: &str = "RELEASES";

const OCTET_STREAM: &str = "application/octet-stream";

const DEFAULT_PER_PAGE: u32 = 30;
const DEFAULT_PAGE: u32 = 1;

/// An update source backed by a project's releases on GitLab. Use the
/// [`GitLabSourceBuilder`](crate::GitLabSourceBuilder) struct to create a
/// `GitLabSource` instance.
#[derive(Debug)]
pub struct GitLabSource {
    repo_url: Url,
    api_base_url: Url,
    token: Option<String>,
    include_upcoming: bool,
    downloader: Box<dyn Downloader>,
    parser: Box<dyn EntryParser>,
    bound_release: Option<Release>,
}

impl GitLabSource {
    pub(crate) fn new(
        repo_url: Url,
        api_base_url: Url,
        token: Option<String>,
        include_upcoming: bool,
        downloader: Box<dyn Downloader>,
        parser: Box<dyn EntryParser>,
    ) -> GitLabSource {
        GitLabSource {
            repo_url,
            api_base_url,
            token,
            include_upcoming,
            downloader,
            parser,
            bound_release: None,
        }
    }

    /// The release this source is bound to, if a feed has been resolved or a
    /// release was bound explicitly.
    pub fn bound_release(&self) -> Option<&Release> {
        self.bound_release.as_ref()
    }

    /// Explicitly binds this source to a release, as if it had just been
    /// resolved from the feed. Every later download is served from it.
    pub fn bind_release(&mut self, release: Release) {
        self.bound_release = Some(release);
    }

    /// Fetches one page of the project's releases and returns them most
    /// recently published first.
    ///
    /// Releases without a publication timestamp sort as oldest, and ties keep
    /// the order the server returned them in. When `include_upcoming` is
    /// false, prereleases are dropped after sorting. No de-duplication by
    /// name is done.
    ///
    /// `per_page` defaults to 30 and `page` to 1.
    ///
    /// # Errors
    ///
    /// Transport failures propagate unchanged from the downloader; a body
    /// that does not decode as a list of releases fails with
    /// [`Error::FeedDecode`].
    pub async fn fetch_releases(
        &self,
        include_upcoming: bool,
        per_page: Option<u32>,
        page: Option<u32>,
    ) -> Result<Vec<Release>> {
        let url = self.releases_url(
            per_page.unwrap_or(DEFAULT_PER_PAGE),
            page.unwrap_or(DEFAULT_PAGE),
        );
        debug!("Fetching releases from `{url}`");

        let auth = auth_header(self.token.as_deref())?;
        let body = self.downloader.download_string(&url, auth.as_ref()).await?;
        let mut releases: Vec<Release> =
            serde_json::from_str(&body).map_err(|source| Error::FeedDecode {
                repository: self.repo_url.to_string(),
                source,
            })?;

        // Sort first, then filter, so that the newest *allowed* release ends
        // up in front. sort_by is stable, which keeps upstream order for
        // releases published at the same instant.
        releases.sort_by(|a, b| b.released_at.cmp(&a.released_at));
        if !include_upcoming {
            releases.retain(|r| !r.upcoming_release);
        }

        Ok(releases)
    }

    /// Builds the releases API URL: the configured API base host, the
    /// repository URL's path, a trailing `releases` segment, and pagination
    /// query parameters.
    fn releases_url(&self, per_page: u32, page: u32) -> Url {
        let mut url = self.api_base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .expect("could not get path segments for url");
            segments.pop_if_empty();
            for segment in self
                .repo_url
                .path_segments()
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
            {
                segments.push(segment);
            }
            segments.push("releases");
        }
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    fn is_authenticated(&self) -> bool {
        self.token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    async fn resolve_feed_impl(&mut self, staging_id: Option<&str>) -> Result<Vec<UpdateEntry>> {
        let releases = self
            .fetch_releases(self.include_upcoming, None, None)
            .await?;
        let Some(release) = releases.into_iter().next() else {
            return Err(Error::NoReleasesFound {
                repository: self.repo_url.to_string(),
            });
        };
        debug!("Resolved release `{}`", release.name);

        let manifest_url =
            resolve_asset_url(&release, MANIFEST_ASSET_NAME, self.is_authenticated())?.clone();

        // Bind before fetching the manifest. Everything downloaded from this
        // point on, the manifest included, comes from this one release.
        self.bound_release = Some(release);

        let auth = auth_header(self.token.as_deref())?;
        let bytes = self
            .downloader
            .download_bytes(&manifest_url, auth.as_ref(), OCTET_STREAM)
            .await?;
        let text = manifest_text(&bytes);

        self.parser.parse_and_apply_staging(&text, staging_id)
    }

    async fn download_asset_impl(
        &self,
        entry: &UpdateEntry,
        dest: &Path,
        progress: Option<&ProgressFn>,
    ) -> Result<()> {
        let Some(release) = self.bound_release.as_ref() else {
            return Err(Error::NoBoundRelease);
        };

        let url = resolve_asset_url(release, &entry.file_name, self.is_authenticated())?;
        debug!(
            "Downloading `{}` from release `{}`",
            entry.file_name, release.name
        );

        let auth = auth_header(self.token.as_deref())?;
        self.downloader
            .download_file(url, dest, progress, auth.as_ref(), OCTET_STREAM)
            .await
    }
}

#[async_trait]
impl UpdateSource for GitLabSource {
    async fn resolve_feed(
        &mut self,
        staging_id: Option<&str>,
        _latest_local_entry: Option<&UpdateEntry>,
    ) -> Result<Vec<UpdateEntry>> {
        self.resolve_feed_impl(staging_id).await
    }

    async fn download_asset(
        &mut self,
        entry: &UpdateEntry,
        dest: &Path,
        progress: Option<&ProgressFn>,
    ) -> Result<()> {
        self.download_asset_impl(entry, dest, progress).await
    }
}

/// Decodes manifest bytes as UTF-8, stripping a leading byte-order marker if
/// one is present.
fn manifest_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}
