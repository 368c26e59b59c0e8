use anyhow::Result;
use gitup::{GitLabSourceBuilder, UpdateSource};
use mockito::{Matcher, Server};
use serde_json::json;
use serial_test::serial;
use std::env;

// End to end over the public API: resolve a feed from a mocked releases API,
// then download the package the feed names, and check that everything came
// from the release the session bound.
#[test_log::test(tokio::test)]
#[serial]
async fn resolve_then_download() -> Result<()> {
    let vars: Vec<(String, String)> = env::vars().collect();
    env::remove_var("CI_JOB_TOKEN");
    env::remove_var("GITLAB_TOKEN");

    let mut server = Server::new_async().await;
    let base = server.url();

    let releases = json!([
        {
            "name": "v1.1.0",
            "upcoming_release": true,
            "released_at": "2023-06-01T00:00:00Z",
            "assets": { "count": 0, "links": [] }
        },
        {
            "name": "v1.0.0",
            "upcoming_release": false,
            "released_at": "2023-01-01T00:00:00Z",
            "assets": {
                "count": 2,
                "links": [
                    {
                        "name": "RELEASES",
                        "url": format!("{base}/api/v1.0.0/RELEASES"),
                        "direct_asset_url": format!("{base}/direct/v1.0.0/RELEASES"),
                        "link_type": "other"
                    },
                    {
                        "name": "app-1.0.0-full.nupkg",
                        "url": format!("{base}/api/v1.0.0/app-1.0.0-full.nupkg"),
                        "direct_asset_url": format!("{base}/direct/v1.0.0/app-1.0.0-full.nupkg"),
                        "link_type": "package"
                    }
                ]
            }
        }
    ]);

    let feed = server
        .mock("GET", "/group/project/releases")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "30".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .match_header("Authorization", mockito::Matcher::Missing)
        .with_status(200)
        .with_body(releases.to_string())
        .expect(1)
        .create_async()
        .await;

    // UTF-8 BOM in front of the manifest, which must not survive parsing.
    let mut manifest_body = vec![0xEF, 0xBB, 0xBF];
    manifest_body
        .extend_from_slice(b"94CCB648B49F24B80E176C8488C136D1AB31446E app-1.0.0-full.nupkg 13\n");
    let manifest = server
        .mock("GET", "/direct/v1.0.0/RELEASES")
        .match_header("Accept", "application/octet-stream")
        .with_status(200)
        .with_body(manifest_body)
        .create_async()
        .await;

    let package = server
        .mock("GET", "/direct/v1.0.0/app-1.0.0-full.nupkg")
        .match_header("Accept", "application/octet-stream")
        .with_status(200)
        .with_body("package bytes")
        .create_async()
        .await;

    let mut source = GitLabSourceBuilder::new()
        .repo_url("https://gitlab.com/group/project")
        .api_base_url(&base)
        .build()?;

    // v1.1.0 is newer but upcoming, so the session binds v1.0.0.
    let entries = source.resolve_feed(None, None).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name, "app-1.0.0-full.nupkg");
    assert_eq!(entries[0].sha1, "94ccb648b49f24b80e176c8488c136d1ab31446e");
    assert_eq!(entries[0].file_size, 13);

    let td = tempfile::tempdir()?;
    let dest = td.path().join(&entries[0].file_name);
    let progress = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    let report = {
        let progress = std::sync::Arc::clone(&progress);
        move |pct: u8| progress.lock().unwrap().push(pct)
    };
    source
        .download_asset(&entries[0], &dest, Some(&report))
        .await?;

    assert_eq!(std::fs::read_to_string(&dest)?, "package bytes");
    let reported = progress.lock().unwrap().clone();
    assert_eq!(*reported.last().unwrap(), 100);
    assert!(reported.windows(2).all(|w| w[0] <= w[1]));

    feed.assert_async().await;
    manifest.assert_async().await;
    package.assert_async().await;

    for (k, v) in vars {
        env::set_var(k, v);
    }

    Ok(())
}
