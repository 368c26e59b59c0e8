use crate::error::Result;
use log::debug;
use reqwest::header::HeaderValue;

/// Derives the `Authorization` header value for a request, if any.
///
/// A missing, empty, or whitespace-only token produces no header at all. Any
/// other token produces a `Bearer` value marked sensitive so that it is never
/// written out by debug formatting.
pub(crate) fn auth_header(token: Option<&str>) -> Result<Option<HeaderValue>> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        debug!("No access token configured, sending unauthenticated requests.");
        return Ok(None);
    };

    debug!("Adding access token to request.");
    let bearer = format!("Bearer {token}");
    let mut auth_val = HeaderValue::from_str(&bearer)?;
    auth_val.set_sensitive(true);
    Ok(Some(auth_val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rstest::rstest;

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(""))]
    #[case::whitespace(Some("   \t"))]
    fn no_header_without_token(#[case] token: Option<&str>) -> Result<()> {
        assert!(auth_header(token)?.is_none());
        Ok(())
    }

    #[test]
    fn bearer_header_with_token() -> Result<()> {
        let val = auth_header(Some("glpat-fakeToken"))?.unwrap();
        assert!(val.is_sensitive());
        // A sensitive header value hides its contents from Debug but the raw
        // bytes are still what goes on the wire.
        assert_eq!(val.to_str().unwrap(), "Bearer glpat-fakeToken");
        Ok(())
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() -> Result<()> {
        let val = auth_header(Some("  glpat-fakeToken "))?.unwrap();
        assert_eq!(val.to_str().unwrap(), "Bearer glpat-fakeToken");
        Ok(())
    }
}
