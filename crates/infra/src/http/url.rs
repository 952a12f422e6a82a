//! URL and diagnostic string helpers

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static DUPLICATE_SLASHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^:]/)/+").expect("DUPLICATE_SLASHES should compile - this is a bug")
});
static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUNS should compile - this is a bug"));

/// Collapse repeated slashes outside the scheme separator and drop a single
/// trailing slash.
///
/// `https://host//api///orgs/` becomes `https://host/api/orgs`.
pub fn sanitize_url(url: &str) -> String {
    let collapsed = DUPLICATE_SLASHES.replace_all(url, "$1");
    collapsed.strip_suffix('/').unwrap_or(&collapsed).to_string()
}

/// Value of the first `name` query parameter in `url`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    parse_lenient(url)?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Path component of `url`. Relative references are accepted.
pub fn url_path(url: &str) -> Option<String> {
    parse_lenient(url).map(|parsed| parsed.path().to_string())
}

/// Portion of `url` starting at its `/api/` segment.
///
/// `https://host/prefix/api/orgs/o1` becomes `/api/orgs/o1`.
pub fn api_endpoint(url: &str) -> Option<String> {
    url.split("/api/").nth(1).map(|rest| format!("/api/{rest}"))
}

/// Squash whitespace runs to one space and drop escaped newlines so response
/// bodies fit on a single log line.
pub fn clean_string(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").replace("\\n", "")
}

fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost").ok()?.join(url).ok()
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_slashes_but_keeps_scheme() {
        assert_eq!(
            sanitize_url("https://manager.example.com//api///orgs/"),
            "https://manager.example.com/api/orgs"
        );
        assert_eq!(sanitize_url("http://host/"), "http://host");
        assert_eq!(sanitize_url("https://host/api/me"), "https://host/api/me");
    }

    #[test]
    fn query_and_path_helpers() {
        let url = "https://host/api/catalogs?limit=10&offset=20";
        assert_eq!(query_param(url, "offset").as_deref(), Some("20"));
        assert_eq!(query_param(url, "missing"), None);
        assert_eq!(url_path(url).as_deref(), Some("/api/catalogs"));
        assert_eq!(url_path("/api/me?x=1").as_deref(), Some("/api/me"));
    }

    #[test]
    fn api_endpoint_extracts_api_suffix() {
        assert_eq!(
            api_endpoint("https://host/base/api/orgs/o1/catalogs").as_deref(),
            Some("/api/orgs/o1/catalogs")
        );
        assert_eq!(api_endpoint("https://host/consumer-api/me"), None);
    }

    #[test]
    fn clean_string_compacts_bodies() {
        assert_eq!(clean_string("{\n  \"a\":   1,\t\"b\": 2 }"), "{ \"a\": 1, \"b\": 2 }");
        assert_eq!(clean_string(r#"{"message":"line\nbreak"}"#), r#"{"message":"linebreak"}"#);
    }
}
