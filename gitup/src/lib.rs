//! A library for resolving and downloading application updates from GitLab releases.
//!
//! `gitup` is one backend for a generic update-source contract: it figures out the current
//! publishable release of a project hosted on GitLab, reads that release's `RELEASES` manifest to
//! learn which update packages exist, and downloads the package assets belonging to that same
//! release. Other backends target other hosting services; they all implement the same
//! [`UpdateSource`] trait.
//!
//! This project also ships a CLI tool named `gitup`. See [the project's GitHub
//! repo](https://github.com/houseabsolute/gitup) for more details on installing and using this
//! tool.
//!
//! The main entry point for programmatic use is the [`GitLabSourceBuilder`] struct. Here is an
//! example of its usage:
//!
//! ```ignore
//! use gitup::{GitLabSourceBuilder, UpdateSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut source = GitLabSourceBuilder::new()
//!         .repo_url("https://gitlab.com/group/project")
//!         .build()?;
//!
//!     let entries = source.resolve_feed(None, None).await?;
//!     if let Some(latest) = entries.first() {
//!         source
//!             .download_asset(latest, "./downloads/update.nupkg".as_ref(), None)
//!             .await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How a feed is resolved
//!
//! Resolving a feed queries one page of the project's releases from the releases API, sorts them
//! most recently published first (releases without a publication timestamp sort last), and drops
//! upcoming releases unless the source was built with
//! [`include_upcoming`](GitLabSourceBuilder::include_upcoming). The first remaining release
//! becomes the *bound release* for this source. Its `RELEASES` asset is downloaded, a leading
//! byte-order marker is stripped, and the text is handed to the configured [`EntryParser`], which
//! returns the final list of update entries.
//!
//! Every subsequent [`download_asset`](UpdateSource::download_asset) call on the same source
//! serves assets from the bound release, never from a fresh query, so a manifest and the packages
//! downloaded after it always agree even when new releases are published in between.
//!
//! ## Authentication and asset URLs
//!
//! Every asset has two URLs: an API URL that honors the `Authorization` header, and a direct URL
//! that needs no authorization but only exists for publicly accessible releases. When the source
//! has an access token (set explicitly or found in `CI_JOB_TOKEN`/`GITLAB_TOKEN`), downloads
//! always use the API URL; without one they always use the direct URL. There is deliberately no
//! fallback from one to the other.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
//! - `rustls-tls` (default) — enables the `rustls-tls` feature for the `reqwest` crate.
//! - `rustls-tls-native-roots` — enables the `rustls-tls-native-roots` feature for the `reqwest`
//!   crate.
//! - `native-tls` — enables the `native-tls` feature for the `reqwest` crate.
//! - `native-tls-vendored` — enables the `native-tls-vendored` feature for the `reqwest` crate.
//! - `logging` — enables the [`init_logger`] function.

mod assets;
mod auth;
mod builder;
mod downloader;
mod error;
mod gitlab;
mod manifest;
mod release;
mod source;

pub use crate::{
    builder::GitLabSourceBuilder,
    downloader::{Downloader, HttpDownloader, ProgressFn},
    error::{Error, Result},
    gitlab::{GitLabSource, MANIFEST_ASSET_NAME},
    manifest::{EntryParser, ReleasesParser, UpdateEntry},
    release::{AssetCollection, AssetLink, LinkCategory, Release},
    source::UpdateSource,
};

// The version of the `gitup` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// This function initializes logging for the application. It's public for the sake of the `gitup`
/// binary, but it lives in the library crate so that test code can also enable logging.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightBlack)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);
    let level_colors = line_colors.info(Color::Green).debug(Color::Black);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}][{level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    line_colors.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = level_colors.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        // This is very noisy.
        .level_for("hyper", log::LevelFilter::Error)
        .chain(std::io::stderr())
        .apply()
}
