//! Integration tests for the `sync` command.
//!
//! Each test builds a record directory in a temporary folder, stands up a wiremock
//! server in place of the GitHub GraphQL API and drives the whole command through `run`.

use camino::Utf8PathBuf;
use chrono::Utc;
use gh_metadata_lib::metadata::YearMonth;
use gh_metadata_lib::{EXIT_CODE_RUN_ERRORS, Host};
use serde_json::{Value, json};
use std::fs;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
    exit_code: Option<i32>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
            exit_code: None,
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

/// A data repository with the given `software/*.yml` files.
fn data_repo(files: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 temp path");
    fs::create_dir_all(root.join("software")).expect("create software dir");

    for (name, text) in files {
        fs::write(root.join("software").join(name), text).expect("write record");
    }

    (temp_dir, root)
}

fn read_record(root: &Utf8PathBuf, name: &str) -> String {
    fs::read_to_string(root.join("software").join(name)).expect("read record")
}

fn repository(owner: &str, name: &str, stars: u64, commits: u64) -> Value {
    json!({
        "name": name,
        "nameWithOwner": format!("{owner}/{name}"),
        "stargazerCount": stars,
        "isArchived": false,
        "releases": { "nodes": [] },
        "defaultBranchRef": {
            "target": { "committedDate": "2024-03-01T00:00:00Z", "history": { "totalCount": commits } }
        }
    })
}

fn search_response(nodes: &[Value]) -> Value {
    json!({ "data": { "search": { "nodes": nodes } } })
}

async fn run_sync(host: &mut TestHost, root: &Utf8PathBuf, server: &MockServer, extra: &[&str]) -> gh_metadata_lib::Result<()> {
    let api_url = format!("{}/graphql", server.uri());
    let mut args = vec![
        "gh-metadata",
        "sync",
        "--source-directory",
        root.as_str(),
        "--api-url",
        api_url.as_str(),
        "--github-token",
        "test-token",
        "--sleep-time",
        "0",
        "--log-level",
        "none",
        "--color",
        "never",
    ];
    args.extend_from_slice(extra);

    gh_metadata_lib::run(host, args).await
}

fn current_month() -> String {
    YearMonth::from_datetime(Utc::now()).key()
}

#[tokio::test]
async fn test_sync_updates_github_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("repo:alice/foo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_response(&[repository("alice", "foo", 42, 5)]))
                .insert_header("x-ratelimit-limit", "5000")
                .insert_header("x-ratelimit-remaining", "4999"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gitlab = "name: Bar\nsource_code_url: https://gitlab.com/bob/bar\ntags: [Media, Audio]\n";
    let (_temp_dir, root) = data_repo(&[
        ("foo.yml", "name: Foo\nsource_code_url: https://github.com/alice/foo\n"),
        ("bar.yml", gitlab),
    ]);

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &[]).await;

    assert!(result.is_ok(), "sync failed: {result:?}\n{}", host.error_str());
    assert_eq!(host.exit_code, None);
    assert_eq!(
        read_record(&root, "foo.yml"),
        format!(
            "name: Foo\nsource_code_url: https://github.com/alice/foo\nstargazers_count: 42\narchived: false\nupdated_at: 2024-03-01\ncommit_history:\n  {}: 5\n",
            current_month()
        )
    );
    assert_eq!(read_record(&root, "bar.yml"), gitlab);
    assert!(host.output_str().contains("Synced 1 of 1 selected records"), "{}", host.output_str());
}

#[tokio::test]
async fn test_sync_with_failed_middle_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("repo:o/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(&[repository("o", "a", 1, 1)])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("repo:o/b"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("repo:o/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(&[repository("o", "c", 3, 3)])))
        .mount(&server)
        .await;

    let untouched = "name: B\nsource_code_url: https://github.com/o/b\n";
    let (_temp_dir, root) = data_repo(&[
        ("a.yml", "name: A\nsource_code_url: https://github.com/o/a\n"),
        ("b.yml", untouched),
        ("c.yml", "name: C\nsource_code_url: https://github.com/o/c\n"),
    ]);

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &["--batch-size", "1"]).await;

    let _ = result.unwrap_err();
    assert_eq!(host.exit_code, Some(EXIT_CODE_RUN_ERRORS));
    assert!(host.error_str().contains("batch 2/3 failed"), "{}", host.error_str());
    assert!(read_record(&root, "a.yml").contains("stargazers_count: 1"));
    assert_eq!(read_record(&root, "b.yml"), untouched);
    assert!(read_record(&root, "c.yml").contains("stargazers_count: 3"));
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let server = MockServer::start().await;
    let mut body = search_response(&[repository("alice", "foo", 42, 5)]);
    body["data"]["search"]["nodes"][0]["releases"] = json!({ "nodes": [{ "tagName": "v1.0.0", "publishedAt": "2024-02-01T09:30:00Z" }] });
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(2)
        .mount(&server)
        .await;

    let (_temp_dir, root) = data_repo(&[(
        "foo.yml",
        "name: Foo\nsource_code_url: https://github.com/alice/foo\ntags:\n  - Media\ncommit_history:\n  2000-01: 9\n",
    )]);

    let mut host = TestHost::new();
    run_sync(&mut host, &root, &server, &[]).await.expect("first sync");
    let first = read_record(&root, "foo.yml");

    run_sync(&mut host, &root, &server, &[]).await.expect("second sync");
    let second = read_record(&root, "foo.yml");

    assert_eq!(first, second);
    assert!(first.contains("tags:\n  - Media\n"), "{first}");
    assert!(first.contains("current_release:\n  tag: v1.0.0\n  published_at: 2024-02-01\n"), "{first}");
}

#[tokio::test]
async fn test_sync_only_missing_skips_complete_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("repo:o/complete"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("repo:o/partial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_response(&[repository("o", "partial", 8, 2)])))
        .expect(1)
        .mount(&server)
        .await;

    let complete = "name: Complete
source_code_url: https://github.com/o/complete
stargazers_count: 1
updated_at: 2024-01-01
archived: false
current_release:
  tag: v1
  published_at: 2024-01-01
commit_history:
  2024-01: 3
";
    let (_temp_dir, root) = data_repo(&[
        ("complete.yml", complete),
        (
            "partial.yml",
            "name: Partial\nwebsite_url: https://github.com/o/partial/\nstargazers_count: 1\n",
        ),
    ]);

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &["--only-missing"]).await;

    assert!(result.is_ok(), "sync failed: {result:?}\n{}", host.error_str());
    assert_eq!(read_record(&root, "complete.yml"), complete);
    assert!(read_record(&root, "partial.yml").contains("stargazers_count: 8"));
}

#[tokio::test]
async fn test_sync_reports_graphql_errors() {
    let server = MockServer::start().await;
    let mut body = search_response(&[repository("o", "a", 4, 0)]);
    body["errors"] = json!([{ "type": "FORBIDDEN", "message": "Resource protected by organization SAML enforcement." }]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let (_temp_dir, root) = data_repo(&[("a.yml", "name: A\nsource_code_url: https://github.com/o/a\n")]);

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &[]).await;

    let _ = result.unwrap_err();
    assert_eq!(host.exit_code, Some(EXIT_CODE_RUN_ERRORS));
    assert!(host.error_str().contains("SAML enforcement"), "{}", host.error_str());
    assert!(read_record(&root, "a.yml").contains("stargazers_count: 4"));
}

#[tokio::test]
async fn test_sync_rejects_duplicate_storage_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (_temp_dir, root) = data_repo(&[
        ("one.yml", "name: My Tool\nsource_code_url: https://github.com/o/one\n"),
        ("two.yml", "name: my_tool\nsource_code_url: https://github.com/o/two\n"),
    ]);

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &[]).await;

    let _ = result.unwrap_err();
    assert_eq!(host.exit_code, None);
}

#[tokio::test]
async fn test_sync_missing_source_directory() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().join("absent")).expect("UTF-8 temp path");

    let mut host = TestHost::new();
    let result = run_sync(&mut host, &root, &server, &[]).await;

    let _ = result.unwrap_err();
}
