/// The `builder` module contains the `GitLabSourceBuilder` struct which is used to create a
/// `GitLabSource` instance.
use crate::{
    downloader::{Downloader, HttpDownloader},
    error::{Error, Result},
    gitlab::{GitLabSource, DEFAULT_API_BASE_URL},
    manifest::{EntryParser, ReleasesParser},
};
use log::debug;
use std::env;
use url::Url;

const TOKEN_ENV_VARS: &[&str] = &["CI_JOB_TOKEN", "GITLAB_TOKEN"];

/// `GitLabSourceBuilder` is used to create a [`GitLabSource`] instance.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct GitLabSourceBuilder<'a> {
    repo_url: Option<&'a str>,
    token: Option<&'a str>,
    include_upcoming: bool,
    api_base_url: Option<&'a str>,
    downloader: Option<Box<dyn Downloader>>,
    parser: Option<Box<dyn EntryParser>>,
}

impl<'a> GitLabSourceBuilder<'a> {
    /// Returns a new empty `GitLabSourceBuilder`.
    #[must_use]
    pub fn new() -> Self {
        GitLabSourceBuilder::default()
    }

    /// Set the URL of the repository whose releases serve the updates, like
    /// `https://gitlab.com/group/project`. Required.
    ///
    /// Only the URL's path identifies the project on the wire. Requests go to
    /// the canonical `gitlab.com` host unless `api_base_url` is also set, so
    /// for a self-hosted instance you must set both.
    #[must_use]
    pub fn repo_url(mut self, repo_url: &'a str) -> Self {
        self.repo_url = Some(repo_url);
        self
    }

    /// Set an access token to use for API requests. Required for private
    /// projects. If this is not set, the token is taken from the
    /// `CI_JOB_TOKEN` or `GITLAB_TOKEN` env var, if one is set. If both are
    /// set, the value in `CI_JOB_TOKEN` is used.
    ///
    /// A blank token is treated the same as no token at all.
    #[must_use]
    pub fn token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    /// Call this to include upcoming (prerelease) releases when resolving
    /// the feed. By default only stable releases are considered.
    #[must_use]
    pub fn include_upcoming(mut self) -> Self {
        self.include_upcoming = true;
        self
    }

    /// Set the base URL for the releases API. This is useful for testing or
    /// for self-hosted GitLab instances. If this isn't set, requests go to
    /// `https://gitlab.com`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Set the transport used for all network access. Defaults to
    /// [`HttpDownloader`].
    #[must_use]
    pub fn downloader(mut self, downloader: Box<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Set the parser that turns manifest text into update entries and
    /// applies any staged-rollout policy. Defaults to [`ReleasesParser`],
    /// which does not filter on staging.
    #[must_use]
    pub fn entry_parser(mut self, parser: Box<dyn EntryParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Builds a new [`GitLabSource`] instance and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository URL was set, if a configured URL
    /// does not parse, or if the default HTTP client cannot be constructed.
    pub fn build(self) -> Result<GitLabSource> {
        let Some(repo_url) = self.repo_url else {
            return Err(Error::MissingRepoUrl);
        };
        let repo_url = parse_url(repo_url)?;
        let api_base_url = match self.api_base_url {
            Some(u) => parse_url(u)?,
            None => DEFAULT_API_BASE_URL.clone(),
        };

        let token = match self.token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(t.to_string()),
            None => token_from_env(),
        };

        let downloader = match self.downloader {
            Some(d) => d,
            None => Box::new(HttpDownloader::new()?),
        };
        let parser = self.parser.unwrap_or_else(|| Box::new(ReleasesParser));

        Ok(GitLabSource::new(
            repo_url,
            api_base_url,
            token,
            self.include_upcoming,
            downloader,
            parser,
        ))
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

fn token_from_env() -> Option<String> {
    for name in TOKEN_ENV_VARS {
        if let Ok(token) = env::var(name) {
            if !token.trim().is_empty() {
                debug!("Using the token from the {name} environment variable.");
                return Some(token);
            }
        }
    }
    None
}
