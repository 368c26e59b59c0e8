use crate::{
    error::{Error, Result},
    release::Release,
};
use log::debug;
use url::Url;

/// Finds the download URL for the named asset within a release.
///
/// Matching is case-insensitive using Unicode default case folding, which does
/// not vary by locale, so the same asset matches no matter where the code
/// runs. The first matching link wins.
///
/// URL selection is a binary policy with no fallback: an authenticated session
/// gets the API URL, since the direct URL may not accept the authorization
/// header and private projects are only reachable through the API path. An
/// unauthenticated session gets the direct URL.
pub(crate) fn resolve_asset_url<'a>(
    release: &'a Release,
    asset_name: &str,
    authenticated: bool,
) -> Result<&'a Url> {
    let links = release
        .assets
        .as_ref()
        .map(|a| a.links.as_slice())
        .unwrap_or_default();
    if links.is_empty() {
        return Err(Error::NoAssetsInRelease {
            release: release.name.clone(),
        });
    }

    let want = asset_name.to_lowercase();
    let link = links
        .iter()
        .find(|l| l.name.to_lowercase() == want)
        .ok_or_else(|| Error::AssetNotFound {
            asset: asset_name.to_string(),
            release: release.name.clone(),
        })?;

    if authenticated {
        debug!("Using the API URL for asset `{}`", link.name);
        Ok(&link.url)
    } else {
        debug!("Using the direct URL for asset `{}`", link.name);
        link.direct_asset_url
            .as_ref()
            .ok_or_else(|| Error::AssetNotPublic {
                asset: link.name.clone(),
                release: release.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{AssetCollection, AssetLink, LinkCategory};
    use anyhow::Result;
    use rstest::rstest;

    fn release_with_links(links: Vec<AssetLink>) -> Release {
        Release {
            name: "v1.0.0".to_string(),
            upcoming_release: false,
            released_at: None,
            assets: Some(AssetCollection {
                count: links.len() as u64,
                links,
            }),
        }
    }

    fn link(name: &str, api: &str, direct: Option<&str>) -> AssetLink {
        AssetLink {
            name: name.to_string(),
            url: Url::parse(api).unwrap(),
            direct_asset_url: direct.map(|d| Url::parse(d).unwrap()),
            link_type: LinkCategory::Other,
        }
    }

    #[test]
    fn no_assets_in_release() {
        let mut release = release_with_links(vec![]);
        let res = resolve_asset_url(&release, "RELEASES", false);
        assert!(matches!(res, Err(Error::NoAssetsInRelease { .. })));

        release.assets = None;
        let res = resolve_asset_url(&release, "RELEASES", false);
        let err = res.unwrap_err();
        assert!(matches!(err, Error::NoAssetsInRelease { .. }));
        assert!(err.to_string().contains("v1.0.0"));
    }

    #[test]
    fn asset_not_found() {
        let release = release_with_links(vec![link(
            "app.nupkg",
            "https://host/api/app.nupkg",
            Some("https://host/app.nupkg"),
        )]);
        let err = resolve_asset_url(&release, "RELEASES", false).unwrap_err();
        assert!(matches!(err, Error::AssetNotFound { .. }));
        assert!(err.to_string().contains("RELEASES"));
        assert!(err.to_string().contains("v1.0.0"));
    }

    #[rstest]
    #[case::exact("RELEASES")]
    #[case::lower("releases")]
    #[case::mixed("ReLeAsEs")]
    fn matching_ignores_case(#[case] lookup: &str) -> Result<()> {
        let release = release_with_links(vec![link(
            "RELEASES",
            "https://host/api/a",
            Some("https://host/a"),
        )]);
        let url = resolve_asset_url(&release, lookup, false)?;
        assert_eq!(url.as_str(), "https://host/a");
        Ok(())
    }

    #[test]
    fn matching_ignores_case_for_non_ascii_names() -> Result<()> {
        let release = release_with_links(vec![link(
            "Paketinstallationsprogramm-GROSS.exe",
            "https://host/api/a",
            Some("https://host/a"),
        )]);
        let url = resolve_asset_url(&release, "paketinstallationsprogramm-gross.exe", false)?;
        assert_eq!(url.as_str(), "https://host/a");
        Ok(())
    }

    #[test]
    fn first_match_wins() -> Result<()> {
        let release = release_with_links(vec![
            link("RELEASES", "https://host/api/first", Some("https://host/first")),
            link("releases", "https://host/api/second", Some("https://host/second")),
        ]);
        let url = resolve_asset_url(&release, "RELEASES", false)?;
        assert_eq!(url.as_str(), "https://host/first");
        Ok(())
    }

    #[rstest]
    #[case::authenticated(true, "https://host/api/a")]
    #[case::unauthenticated(false, "https://host/a")]
    fn url_selection_follows_token_policy(
        #[case] authenticated: bool,
        #[case] expect: &str,
    ) -> Result<()> {
        let release = release_with_links(vec![link(
            "RELEASES",
            "https://host/api/a",
            Some("https://host/a"),
        )]);
        let url = resolve_asset_url(&release, "RELEASES", authenticated)?;
        assert_eq!(url.as_str(), expect);
        Ok(())
    }

    #[test]
    fn missing_direct_url_is_an_error_without_a_token() {
        let release = release_with_links(vec![link("RELEASES", "https://host/api/a", None)]);
        // With a token the API URL still works.
        assert!(resolve_asset_url(&release, "RELEASES", true).is_ok());
        let err = resolve_asset_url(&release, "RELEASES", false).unwrap_err();
        assert!(matches!(err, Error::AssetNotPublic { .. }));
    }
}
