use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// One release of a project, as returned by the GitLab releases API.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Release {
    /// The human-readable release name. Not guaranteed unique.
    pub name: String,
    /// True for releases whose `released_at` is in the future.
    #[serde(default)]
    pub upcoming_release: bool,
    /// When the release was published. Unset for unpublished releases, which
    /// sort as older than every published release.
    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,
    /// The release's assets, if any.
    #[serde(default)]
    pub assets: Option<AssetCollection>,
}

/// The assets attached to a release.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AssetCollection {
    /// The number of assets the server says it has. Informational only; the
    /// authoritative list is `links`.
    #[serde(default)]
    pub count: u64,
    /// The asset links, in the order the server returned them.
    #[serde(default)]
    pub links: Vec<AssetLink>,
}

/// One downloadable file attached to a release.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssetLink {
    /// The asset's filename. Lookups against this name are case-insensitive.
    pub name: String,
    /// The API download URL. Requires the same authorization scheme as the
    /// rest of the releases API, and works for private projects.
    pub url: Url,
    /// The public download URL. Usable without authorization, but unset when
    /// the release is not publicly accessible.
    #[serde(default)]
    pub direct_asset_url: Option<Url>,
    /// What kind of file this is. Informational only.
    #[serde(default)]
    pub link_type: LinkCategory,
}

/// The category of an asset link. This is an open set on the server side, so
/// unknown values decode as [`LinkCategory::Other`] rather than failing.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Package,
    Image,
    Runbook,
    #[default]
    #[serde(other)]
    Other,
}
