use core::fmt::{Display, Formatter};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// GitHub repository URLs: `https://github.com/<owner>/<repo>` with an optional trailing slash
static REPO_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://github\.com/([\w.\-]+)/([\w.\-]+)/?$").expect("invalid regex"));

/// A GitHub repository identified by owner and name, case preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse a repository URL.
    ///
    /// Returns `None` for anything that is not exactly a GitHub repository URL, including
    /// URLs with extra path segments, query strings or other hosts.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let caps = REPO_URL_REGEX.captures(url)?;
        Some(Self {
            owner: Arc::from(caps.get(1)?.as_str()),
            repo: Arc::from(caps.get(2)?.as_str()),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The `owner/repo` form used in search qualifiers.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Whether `name` is this repository's name, ignoring case.
    #[must_use]
    pub fn matches_repo(&self, name: &str) -> bool {
        self.repo.eq_ignore_ascii_case(name)
    }

    /// Whether `name_with_owner` (`owner/repo`) identifies this repository, ignoring case.
    #[must_use]
    pub fn matches_full_name(&self, name_with_owner: &str) -> bool {
        name_with_owner
            .split_once('/')
            .is_some_and(|(owner, repo)| self.owner.eq_ignore_ascii_case(owner) && self.matches_repo(repo))
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
