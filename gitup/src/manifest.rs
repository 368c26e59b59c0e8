use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One installable update, as listed in a release's `RELEASES` manifest.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UpdateEntry {
    /// The SHA1 checksum of the package file, lowercase hex.
    pub sha1: String,
    /// The package filename. This is the name used to look up the matching
    /// asset when downloading.
    pub file_name: String,
    /// The package size in bytes.
    pub file_size: u64,
    /// The staged-rollout percentage for this entry, when the manifest
    /// carries one. `None` means the entry is fully rolled out.
    pub staging_percentage: Option<u8>,
}

/// Parses manifest text into update entries and applies any staged-rollout
/// policy.
///
/// How (or whether) `staging_id` limits the returned entries is entirely up
/// to the implementation; this crate only hands it through.
pub trait EntryParser: std::fmt::Debug + Send + Sync {
    /// Parses the manifest and returns the entries visible to `staging_id`,
    /// in manifest order.
    fn parse_and_apply_staging(
        &self,
        text: &str,
        staging_id: Option<&str>,
    ) -> Result<Vec<UpdateEntry>>;
}

/// The default [`EntryParser`].
///
/// Parses rows of the form `<sha1> <file-name> <size>`, optionally followed
/// by a `# <percentage>%` staging marker. Blank lines and comment lines are
/// skipped. This parser records staging percentages but does not filter on
/// them, so every entry is returned regardless of `staging_id`.
#[derive(Debug, Default)]
pub struct ReleasesParser;

impl EntryParser for ReleasesParser {
    fn parse_and_apply_staging(
        &self,
        text: &str,
        _staging_id: Option<&str>,
    ) -> Result<Vec<UpdateEntry>> {
        let mut entries = vec![];
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            entries.push(parse_row(line).ok_or_else(|| Error::ManifestParse {
                line: idx + 1,
                text: line.to_string(),
            })?);
        }
        Ok(entries)
    }
}

fn parse_row(line: &str) -> Option<UpdateEntry> {
    let (row, staging_percentage) = match line.split_once('#') {
        Some((row, marker)) => (row, Some(parse_staging_marker(marker)?)),
        None => (line, None),
    };

    let mut fields = row.split_whitespace();
    let sha1 = fields.next()?;
    let file_name = fields.next()?;
    let file_size = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }

    Some(UpdateEntry {
        sha1: sha1.to_lowercase(),
        file_name: file_name.to_string(),
        file_size,
        staging_percentage,
    })
}

fn parse_staging_marker(marker: &str) -> Option<u8> {
    let pct: u8 = marker.trim().strip_suffix('%')?.parse().ok()?;
    (pct <= 100).then_some(pct)
}
