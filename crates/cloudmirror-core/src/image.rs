//! Source image reference decomposition

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static REGISTRY_PATH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]*/(.+):(.+)$").expect("valid image reference pattern"));

/// Repository and tag derived from a source image reference
///
/// The leading path segment (normally the source registry host) is dropped,
/// so `docker.io/library/nginx:1.25` mirrors to `library/nginx:1.25` on every
/// destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub const DEFAULT_TAG: &'static str = "latest";

    /// Decompose a source reference into `(repository, tag)`
    ///
    /// # Examples
    /// - `docker.io/library/nginx:latest` -> `("library/nginx", "latest")`
    /// - `nginx:1.0` -> `("nginx", "1.0")`
    /// - `quay.io/app` -> `("quay.io/app", "latest")`
    pub fn parse(source: &str) -> Self {
        if let Some(caps) = REGISTRY_PATH_TAG.captures(source) {
            return Self {
                repository: caps[1].to_string(),
                tag: caps[2].to_string(),
            };
        }

        if let Some((repo, tag)) = source.rsplit_once(':') {
            let repository = match repo.split_once('/') {
                Some((_, rest)) => rest,
                None => repo,
            };
            return Self {
                repository: repository.to_string(),
                tag: tag.to_string(),
            };
        }

        Self {
            repository: source.to_string(),
            tag: Self::DEFAULT_TAG.to_string(),
        }
    }

    /// `repository:tag` as appended to a destination host
    pub fn path(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registry_path_tag() {
        let image = ImageRef::parse("docker.io/library/nginx:latest");
        assert_eq!(image.repository, "library/nginx");
        assert_eq!(image.tag, "latest");
    }

    #[test]
    fn test_parse_single_segment_path() {
        let image = ImageRef::parse("repo/nginx:1.0");
        assert_eq!(image.repository, "nginx");
        assert_eq!(image.tag, "1.0");
    }

    #[test]
    fn test_parse_without_registry() {
        let image = ImageRef::parse("nginx:1.0");
        assert_eq!(image.repository, "nginx");
        assert_eq!(image.tag, "1.0");
    }

    #[test]
    fn test_parse_without_tag_defaults_to_latest() {
        let image = ImageRef::parse("quay.io/prometheus/prometheus");
        assert_eq!(image.repository, "quay.io/prometheus/prometheus");
        assert_eq!(image.tag, "latest");
    }

    #[test]
    fn test_parse_uses_last_colon_for_tag() {
        let image = ImageRef::parse("ghcr.io/grafana/grafana:9.0.0");
        assert_eq!(image.path(), "grafana/grafana:9.0.0");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "ghcr.io/org/app:v2";
        assert_eq!(ImageRef::parse(source), ImageRef::parse(source));
    }
}
