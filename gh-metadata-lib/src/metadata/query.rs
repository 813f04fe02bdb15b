use super::{Candidate, YearMonth};

/// Build the GraphQL query fetching metadata for every repository in a batch.
///
/// A single `search` over `repo:` qualifiers returns all repositories at once. For each one it
/// asks for the star count, archived flag, newest release, and the default branch's latest
/// commit date plus the number of commits made during `month`.
#[must_use]
pub fn build_search_query(batch: &[Candidate], month: YearMonth) -> String {
    let qualifiers = batch
        .iter()
        .map(|c| format!("repo:{}", c.repo.full_name()))
        .collect::<Vec<_>>()
        .join(" ");

    let since = month.start_timestamp();
    let until = month.next().start_timestamp();
    let first = batch.len().max(1);

    format!(
        r#"query {{
  search(type: REPOSITORY, query: "{qualifiers}", first: {first}) {{
    nodes {{
      ... on Repository {{
        name
        nameWithOwner
        stargazerCount
        isArchived
        releases(first: 1, orderBy: {{field: CREATED_AT, direction: DESC}}) {{
          nodes {{
            tagName
            publishedAt
          }}
        }}
        defaultBranchRef {{
          target {{
            ... on Commit {{
              committedDate
              history(since: "{since}", until: "{until}") {{
                totalCount
              }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"#
    )
}
