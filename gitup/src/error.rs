use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// The error type for every fallible operation in this crate.
///
/// This layer never retries and never recovers locally. Every variant carries
/// the repository, release, or asset name it relates to so that callers can
/// produce a useful diagnostic without any additional context.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The releases feed for the repository was empty after filtering.
    #[error("no releases were found for the repository at `{repository}`")]
    NoReleasesFound {
        /// The configured repository URL.
        repository: String,
    },

    /// The release has no asset collection, or its collection has no links.
    #[error("the release named `{release}` has no assets")]
    NoAssetsInRelease {
        /// The release name.
        release: String,
    },

    /// No asset link in the release matched the requested name.
    #[error("the release named `{release}` has no asset named `{asset}`")]
    AssetNotFound {
        /// The asset name that was looked up.
        asset: String,
        /// The release name.
        release: String,
    },

    /// The asset exists but has no direct download URL, and no access token
    /// is configured, so the authenticated API URL cannot be used either.
    #[error(
        "the asset named `{asset}` in the release named `{release}` has no direct download URL; \
         accessing it requires an access token"
    )]
    AssetNotPublic {
        /// The asset name.
        asset: String,
        /// The release name.
        release: String,
    },

    /// The response body from the releases API could not be decoded.
    #[error("could not decode the releases feed for the repository at `{repository}`")]
    FeedDecode {
        /// The configured repository URL.
        repository: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A row of the `RELEASES` manifest did not have the expected shape.
    #[error("could not parse line {line} of the release manifest: `{text}`")]
    ManifestParse {
        /// The 1-based line number within the manifest.
        line: usize,
        /// The offending line.
        text: String,
    },

    /// An asset download was requested before any release had been resolved.
    ///
    /// This is a usage error, not a transient condition. Callers must resolve
    /// a feed first and must not retry on this error.
    #[error("an asset download was requested before any release was resolved")]
    NoBoundRelease,

    /// The server responded with a non-success status.
    #[error("error requesting {url}: {status}\n{body}")]
    UnexpectedStatus {
        /// The requested URL.
        url: Url,
        /// The response status.
        status: StatusCode,
        /// The response body, if it could be read.
        body: String,
    },

    /// The builder was not given a repository URL.
    #[error("you must set a repository URL before calling build")]
    MissingRepoUrl,

    /// A configured URL could not be parsed.
    #[error("could not parse `{url}` as a URL")]
    InvalidUrl {
        /// The text that failed to parse.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A transport-level failure from the HTTP client, passed through
    /// unmodified.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// An access token that cannot be represented as an HTTP header value.
    #[error(transparent)]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// Writing a downloaded asset to the destination path failed.
    #[error("could not write downloaded asset to `{path}`")]
    DownloadWrite {
        /// The destination path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A `Result` alias defaulting to this crate's [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
