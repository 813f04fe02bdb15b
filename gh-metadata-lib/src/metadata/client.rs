//! GitHub GraphQL API client
//!
//! Minimal client for sending one aggregate query per batch and decoding only the fields
//! the synchronization needs.

use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use ohno::IntoAppError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

const LOG_TARGET: &str = "    client";

/// Default GraphQL endpoint
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Decoded body of a search query.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Option<SearchData>,

    /// Query-level errors reported alongside (or instead of) the data
    #[serde(default)]
    pub errors: Vec<QueryError>,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: SearchConnection,
}

#[derive(Debug, Deserialize)]
pub struct SearchConnection {
    #[serde(default)]
    pub nodes: Vec<Option<RepositoryNode>>,
}

/// Metadata for one repository, as returned by the search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name: String,
    #[serde(default)]
    pub name_with_owner: Option<String>,
    pub stargazer_count: u64,
    pub is_archived: bool,
    #[serde(default)]
    pub releases: ReleaseConnection,
    #[serde(default)]
    pub default_branch_ref: Option<BranchRef>,
}

impl RepositoryNode {
    /// The newest release, if the repository has any.
    #[must_use]
    pub fn latest_release(&self) -> Option<&Release> {
        self.releases.nodes.iter().flatten().next()
    }

    /// Date of the latest commit on the default branch.
    #[must_use]
    pub fn last_commit_date(&self) -> Option<DateTime<Utc>> {
        self.default_branch_ref.as_ref()?.target.as_ref()?.committed_date
    }

    /// Number of commits on the default branch during the queried month.
    #[must_use]
    pub fn commits_this_month(&self) -> u64 {
        self.default_branch_ref
            .as_ref()
            .and_then(|r| r.target.as_ref())
            .and_then(|t| t.history.as_ref())
            .map_or(0, |h| h.total_count)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseConnection {
    #[serde(default)]
    pub nodes: Vec<Option<Release>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(default)]
    pub target: Option<CommitTarget>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitTarget {
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Option<History>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub total_count: u64,
}

/// An entry of the GraphQL `errors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Rate limit counters reported in response headers.
///
/// Purely diagnostic: the synchronizer paces itself with a fixed delay between batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub used: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl Display for RateLimitInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        fn count(value: Option<u64>) -> String {
            value.map_or_else(|| "?".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "limit={}, remaining={}, used={}",
            count(self.limit),
            count(self.remaining),
            count(self.used)
        )?;

        if let Some(reset_at) = self.reset_at {
            write!(f, ", reset={}", reset_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }

        Ok(())
    }
}

/// Result of a query
#[derive(Debug)]
pub enum QueryResult {
    /// The request succeeded and the body was decoded. The body may still carry `errors`.
    Success(SearchResponse, Option<RateLimitInfo>),

    /// Transport failure, non-success status, or an undecodable body
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

/// GitHub GraphQL client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    endpoint: String,
}

impl Client {
    /// Create a client authenticating with a bearer `token` against `endpoint`.
    pub fn new(token: &str, endpoint: impl Into<String>) -> crate::Result<Self> {
        let mut auth_val = HeaderValue::from_str(&format!("Bearer {token}")).into_app_err("invalid access token")?;
        auth_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);

        let client = reqwest::Client::builder()
            .user_agent(concat!("gh-metadata/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a query and classify the result.
    pub async fn query(&self, query: &str) -> QueryResult {
        let body = serde_json::json!({ "query": query });

        let resp = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return QueryResult::Failed(e.into(), None),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let detail = detail.trim();
            let error = if detail.is_empty() {
                ohno::app_err!("GitHub API returned HTTP {status}")
            } else {
                ohno::app_err!("GitHub API returned HTTP {status}: {detail}")
            };
            return QueryResult::Failed(error, rate_limit);
        }

        match resp.json::<SearchResponse>().await {
            Ok(decoded) => {
                log::debug!(target: LOG_TARGET, "Decoded search response with {} errors", decoded.errors.len());
                QueryResult::Success(decoded, rate_limit)
            }
            Err(e) => QueryResult::Failed(
                ohno::app_err!("could not decode GitHub API response: {e}"),
                rate_limit,
            ),
        }
    }
}

/// Extract rate limit counters from API response headers.
///
/// Returns `None` when no counter is present or parseable. Header names are matched
/// case-insensitively by `HeaderMap`.
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    fn counter(headers: &HeaderMap, name: &str) -> Option<u64> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    }

    let info = RateLimitInfo {
        limit: counter(headers, "x-ratelimit-limit"),
        remaining: counter(headers, "x-ratelimit-remaining"),
        used: counter(headers, "x-ratelimit-used"),
        reset_at: counter(headers, "x-ratelimit-reset")
            .and_then(|ts| i64::try_from(ts).ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0)),
    };

    (info != RateLimitInfo::default()).then_some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "data": {
                "search": {
                    "nodes": [
                        {
                            "name": "foo",
                            "nameWithOwner": "alice/foo",
                            "stargazerCount": 42,
                            "isArchived": false,
                            "releases": { "nodes": [ { "tagName": "v1.2.0", "publishedAt": "2024-02-10T12:30:00Z" } ] },
                            "defaultBranchRef": {
                                "target": { "committedDate": "2024-03-01T00:00:00Z", "history": { "totalCount": 5 } }
                            }
                        }
                    ]
                }
            }
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.errors.is_empty());

        let nodes = response.data.unwrap().search.nodes;
        let node = nodes[0].as_ref().unwrap();
        assert_eq!(node.name, "foo");
        assert_eq!(node.name_with_owner.as_deref(), Some("alice/foo"));
        assert_eq!(node.stargazer_count, 42);
        assert!(!node.is_archived);
        assert_eq!(node.latest_release().unwrap().tag_name.as_deref(), Some("v1.2.0"));
        assert_eq!(node.last_commit_date().unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(node.commits_this_month(), 5);
    }

    #[test]
    fn test_repository_without_releases_or_branch() {
        let json = r#"{ "name": "empty", "stargazerCount": 0, "isArchived": true, "releases": { "nodes": [] }, "defaultBranchRef": null }"#;

        let node: RepositoryNode = serde_json::from_str(json).unwrap();
        assert!(node.latest_release().is_none());
        assert!(node.last_commit_date().is_none());
        assert_eq!(node.commits_this_month(), 0);
        assert!(node.is_archived);
    }

    #[test]
    fn test_errors_with_partial_data() {
        let json = r#"{
            "data": { "search": { "nodes": [null] } },
            "errors": [
                { "type": "NOT_FOUND", "message": "Could not resolve to a Repository" },
                { "message": "Something else" }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].to_string(), "NOT_FOUND: Could not resolve to a Repository");
        assert_eq!(response.errors[1].to_string(), "Something else");
        assert!(response.data.unwrap().search.nodes[0].is_none());
    }

    #[test]
    fn test_errors_without_data() {
        let json = r#"{ "errors": [ { "message": "Parse error on \"}\"" } ] }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn test_extract_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        let _ = headers.insert("x-ratelimit-used", HeaderValue::from_static("1"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();

        assert_eq!(rate_limit.limit, Some(5000));
        assert_eq!(rate_limit.remaining, Some(4999));
        assert_eq!(rate_limit.used, Some(1));
        assert_eq!(rate_limit.reset_at.unwrap().timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_extract_rate_limit_header_names_ignore_case() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            reqwest::header::HeaderName::from_bytes(b"X-RateLimit-Remaining").unwrap(),
            HeaderValue::from_static("12"),
        );

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();
        assert_eq!(rate_limit.remaining, Some(12));
        assert_eq!(rate_limit.limit, None);
    }

    #[test]
    fn test_extract_rate_limit_missing_headers() {
        let headers = HeaderMap::new();
        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_extract_rate_limit_invalid_values() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("invalid"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("soon"));

        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_rate_limit_display() {
        let info = RateLimitInfo {
            limit: Some(5000),
            remaining: Some(4990),
            used: None,
            reset_at: DateTime::from_timestamp(1_704_067_200, 0),
        };

        assert_eq!(info.to_string(), "limit=5000, remaining=4990, used=?, reset=2024-01-01 00:00:00 UTC");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot initialize the TLS backend")]
    fn test_client_new() {
        let client = Client::new("test_token", GITHUB_GRAPHQL_URL).unwrap();
        assert_eq!(client.endpoint(), GITHUB_GRAPHQL_URL);
    }

    #[test]
    fn test_client_rejects_token_with_newline() {
        let _ = Client::new("bad\ntoken", GITHUB_GRAPHQL_URL).unwrap_err();
    }
}
