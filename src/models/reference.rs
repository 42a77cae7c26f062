//! Repository references parsed from GitHub URLs.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

const HOST: &str = "github.com/";

/// A normalized `owner/name` pair identifying a GitHub repository.
///
/// Only constructible through [`RepositoryReference::parse`], so both parts
/// are always non-empty and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    owner: String,
    name: String,
}

impl RepositoryReference {
    /// Parses `[http(s)://]github.com/<owner>/<name>` followed by end of
    /// input or one of `/`, `?`, `#`.
    ///
    /// The input is lower-cased first. The owner is any non-empty run of
    /// characters other than `/`; the name is a non-empty run of
    /// `[a-z0-9._-]`.
    pub fn parse(url: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidReference(url.to_string());

        let lowered = url.to_lowercase();
        let rest = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        let rest = rest.strip_prefix(HOST).ok_or_else(invalid)?;

        let (owner, rest) = rest.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() {
            return Err(invalid());
        }

        let name_len = rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_len);
        if name.is_empty() {
            return Err(invalid());
        }
        match tail.chars().next() {
            None | Some('/') | Some('?') | Some('#') => {}
            Some(_) => return Err(invalid()),
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone URL under `base_url`, e.g. `https://github.com/owner/name.git`.
    pub fn clone_url(&self, base_url: &str) -> String {
        let suffix = if self.name.ends_with(".git") { "" } else { ".git" };
        format!(
            "{}/{}/{}{}",
            base_url.trim_end_matches('/'),
            self.owner,
            self.name,
            suffix
        )
    }

    /// Filesystem-safe rendering of the reference, used for workspace names.
    pub fn dir_name(&self) -> String {
        format!("{}__{}", sanitize(&self.owner), sanitize(&self.name))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect()
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryReference {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(url: &str) -> (String, String) {
        let r = RepositoryReference::parse(url).expect("should parse");
        (r.owner().to_string(), r.name().to_string())
    }

    #[test]
    fn test_parse_recognized_shapes() {
        let expected = ("vercel".to_string(), "next.js".to_string());
        assert_eq!(parts("https://github.com/vercel/next.js"), expected);
        assert_eq!(parts("http://github.com/vercel/next.js"), expected);
        assert_eq!(parts("github.com/vercel/next.js"), expected);
        assert_eq!(parts("https://github.com/vercel/next.js/"), expected);
        assert_eq!(parts("https://github.com/vercel/next.js/tree/canary/docs"), expected);
        assert_eq!(parts("https://github.com/vercel/next.js?tab=readme"), expected);
        assert_eq!(parts("https://github.com/vercel/next.js#readme"), expected);
    }

    #[test]
    fn test_parse_lowercases() {
        assert_eq!(
            parts("https://GitHub.com/Supabase/Supabase"),
            ("supabase".to_string(), "supabase".to_string())
        );
    }

    #[test]
    fn test_parse_keeps_git_suffix_in_name() {
        let r = RepositoryReference::parse("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(r.name(), "widgets.git");
        assert_eq!(
            r.clone_url("https://github.com"),
            "https://github.com/acme/widgets.git"
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for url in [
            "",
            "https://gitlab.com/acme/widgets",
            "https://www.github.com/acme/widgets",
            "https://github.com/acme",
            "https://github.com/acme/",
            "https://github.com//widgets",
            "https://github.com/acme/wid gets",
            "https://github.com/acme/widgets@main",
            "ftp://github.com/acme/widgets",
            "not a url",
        ] {
            assert!(
                matches!(
                    RepositoryReference::parse(url),
                    Err(AppError::InvalidReference(_))
                ),
                "expected rejection for {url:?}"
            );
        }
    }

    #[test]
    fn test_display_and_clone_url() {
        let r: RepositoryReference = "https://github.com/acme/widgets".parse().unwrap();
        assert_eq!(r.to_string(), "acme/widgets");
        assert_eq!(
            r.clone_url("https://github.com/"),
            "https://github.com/acme/widgets.git"
        );
        assert_eq!(
            r.clone_url("file:///srv/git"),
            "file:///srv/git/acme/widgets.git"
        );
    }

    #[test]
    fn test_dir_name_is_filesystem_safe() {
        let r = RepositoryReference::parse("https://github.com/a:b..c/widgets").unwrap();
        assert_eq!(r.dir_name(), "a_b..c__widgets");
        assert!(!r.dir_name().contains('/'));
    }
}
