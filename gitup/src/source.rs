use crate::{downloader::ProgressFn, error::Result, manifest::UpdateEntry};
use async_trait::async_trait;
use std::path::Path;

/// The contract shared by every update-source backend.
///
/// A source moves between two states. It starts out unbound. A successful
/// [`resolve_feed`](UpdateSource::resolve_feed) call binds it to the single
/// release the feed was served from, and every later
/// [`download_asset`](UpdateSource::download_asset) call resolves asset URLs
/// against that exact release rather than re-querying the backend. This
/// guarantees that a manifest and the assets downloaded afterward come from
/// the same release even if new releases appear in between. Re-resolving
/// rebinds; only dropping the source clears the binding.
///
/// Both operations take `&mut self`, so the compiler enforces that all calls
/// on one source are serialized. Use one source per logical update session;
/// to run concurrent update checks, create one source each.
#[async_trait]
pub trait UpdateSource: std::fmt::Debug + Send {
    /// Resolves the current update feed and binds this source to the release
    /// it came from.
    ///
    /// `staging_id` is handed through to the manifest parser for staged
    /// rollouts. `latest_local_entry` is part of the contract for backends
    /// that can resolve incrementally; backends that cannot accept it and
    /// ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached, if the feed is
    /// empty or cannot be decoded, or if the bound release has no usable
    /// manifest asset.
    async fn resolve_feed(
        &mut self,
        staging_id: Option<&str>,
        latest_local_entry: Option<&UpdateEntry>,
    ) -> Result<Vec<UpdateEntry>>;

    /// Downloads the asset for one update entry to a local path.
    ///
    /// Only valid once a release is bound by a successful `resolve_feed`
    /// call. Calling this first is a usage error
    /// ([`Error::NoBoundRelease`](crate::Error::NoBoundRelease)), never a
    /// condition to retry.
    ///
    /// The destination file is created or overwritten. Partial output is
    /// left on disk when the download fails; cleanup is the caller's
    /// responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if no release is bound, if the entry's file has no
    /// matching asset in the bound release, or if the download itself fails.
    async fn download_asset(
        &mut self,
        entry: &UpdateEntry,
        dest: &Path,
        progress: Option<&ProgressFn>,
    ) -> Result<()>;
}
