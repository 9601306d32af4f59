use crate::config::CrawlConfig;
use crate::{ConfigError, ConfigResult};
use std::collections::BTreeSet;
use url::Url;

/// Filter/normalize policy applied to raw `href` values
///
/// A screen is scoped to one site: links are kept only when they point at the
/// configured host or start with the site's article path. Accepted links are
/// rewritten into fully qualified URLs on the site's origin.
///
/// # Rules
///
/// **Accept and normalize:**
/// - `//host/...` scheme-relative links on the target host
/// - `/wiki/...` links under the article path
/// - absolute links on the target origin
///
/// **Reject:**
/// - the source page itself
/// - any `:` in the path (namespaced pages, embedded schemes)
/// - query strings (`?`), percent escapes (`%`) and fragments (`#`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkScreen {
    scheme: String,
    authority: String,
    article_path: String,
}

impl LinkScreen {
    /// Creates a screen for `scheme://authority` with the given article path
    ///
    /// `authority` is the host, optionally followed by `:port`.
    pub fn new(scheme: &str, authority: &str, article_path: &str) -> Self {
        Self {
            scheme: scheme.to_lowercase(),
            authority: authority.to_lowercase(),
            article_path: article_path.to_string(),
        }
    }

    /// Builds the screen from the crawl configuration
    ///
    /// The scheme comes from the seed URL. The authority is the configured
    /// domain, or the seed's host and port when no domain is configured.
    pub fn from_config(config: &CrawlConfig) -> ConfigResult<Self> {
        let seed = Url::parse(&config.seed_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.seed_url, e)))?;

        let authority = match &config.domain {
            Some(domain) => domain.clone(),
            None => {
                let host = seed.host_str().ok_or_else(|| {
                    ConfigError::InvalidUrl(format!("{} has no host", config.seed_url))
                })?;
                match seed.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            }
        };

        Ok(Self::new(seed.scheme(), &authority, &config.article_path))
    }

    /// The `scheme://authority` prefix every accepted link starts with
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Screens a batch of raw links found on `source_url`
    ///
    /// Returns the accepted, normalized links with duplicates removed.
    pub fn screen<I, S>(&self, source_url: &str, links: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        links
            .into_iter()
            .filter_map(|link| self.normalize(link.as_ref()))
            .filter(|candidate| candidate != source_url && self.is_clean(candidate))
            .collect()
    }

    /// Rewrites a single raw link into a fully qualified URL on the target site
    ///
    /// Returns None when the link points elsewhere.
    pub fn normalize(&self, link: &str) -> Option<String> {
        let link = link.trim();
        let origin = self.origin();

        let candidate = if link.starts_with("//") {
            format!("{}:{}", self.scheme, link)
        } else if link.starts_with(&self.article_path) {
            format!("{}{}", origin, link)
        } else {
            link.to_string()
        };

        let prefix = candidate.get(..origin.len())?;
        let rest = candidate.get(origin.len()..)?;
        if !prefix.eq_ignore_ascii_case(&origin) || !rest.starts_with('/') {
            return None;
        }

        // The origin is matched case-insensitively but always emitted lower-case
        Some(format!("{}{}", origin, rest))
    }

    /// Applies the rejection rules to a normalized link
    fn is_clean(&self, candidate: &str) -> bool {
        let path = candidate.get(self.origin().len()..).unwrap_or(candidate);
        !path.contains(':')
            && !candidate.contains('?')
            && !candidate.contains('%')
            && !candidate.contains('#')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://en.wikipedia.org/wiki/Mahatma_Gandhi";

    fn wiki_screen() -> LinkScreen {
        LinkScreen::new("https", "en.wikipedia.org", "/wiki")
    }

    fn screen_one(link: &str) -> Vec<String> {
        wiki_screen().screen(SOURCE, [link]).into_iter().collect()
    }

    #[test]
    fn test_article_path_is_qualified() {
        assert_eq!(
            screen_one("/wiki/Madeleine_Slade"),
            vec!["https://en.wikipedia.org/wiki/Madeleine_Slade"]
        );
    }

    #[test]
    fn test_scheme_relative_is_qualified() {
        assert_eq!(
            screen_one("//en.wikipedia.org/wiki/X"),
            vec!["https://en.wikipedia.org/wiki/X"]
        );
    }

    #[test]
    fn test_absolute_on_site_is_kept() {
        assert_eq!(
            screen_one("https://en.wikipedia.org/wiki/Salt_March"),
            vec!["https://en.wikipedia.org/wiki/Salt_March"]
        );
    }

    #[test]
    fn test_self_link_is_rejected() {
        assert!(screen_one(SOURCE).is_empty());
        assert!(screen_one("/wiki/Mahatma_Gandhi").is_empty());
    }

    #[test]
    fn test_query_fragment_and_escape_are_rejected() {
        assert!(screen_one("/wiki/Example?query=1").is_empty());
        assert!(screen_one("/wiki/Example#History").is_empty());
        assert!(screen_one("/wiki/Caf%C3%A9").is_empty());
    }

    #[test]
    fn test_namespaced_pages_are_rejected() {
        assert!(screen_one("/wiki/File:Gandhi.jpg").is_empty());
        assert!(screen_one("https://en.wikipedia.org/wiki/Special:Random").is_empty());
    }

    #[test]
    fn test_other_hosts_are_rejected() {
        assert!(screen_one("https://de.wikipedia.org/wiki/Gandhi").is_empty());
        assert!(screen_one("//en.wikipedia.org.evil.com/wiki/X").is_empty());
        assert!(screen_one("https://example.com/wiki/X").is_empty());
        assert!(screen_one("/w/index.php").is_empty());
        assert!(screen_one("Relative_Page").is_empty());
        assert!(screen_one("mailto:someone@example.com").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let screened = wiki_screen().screen(
            SOURCE,
            [
                "/wiki/A",
                "//en.wikipedia.org/wiki/A",
                "https://en.wikipedia.org/wiki/A",
                "HTTPS://EN.WIKIPEDIA.ORG/wiki/A",
                "//En.Wikipedia.org/wiki/A",
                "/wiki/B",
            ],
        );
        assert_eq!(screened.len(), 2);
    }

    #[test]
    fn test_origin_case_is_canonical() {
        assert_eq!(
            screen_one("HTTPS://EN.WIKIPEDIA.ORG/wiki/Salt_March"),
            vec!["https://en.wikipedia.org/wiki/Salt_March"]
        );
        // Only the origin is folded, article titles keep their case
        assert_eq!(
            wiki_screen().normalize("Https://en.Wikipedia.org/wiki/SALT"),
            Some("https://en.wikipedia.org/wiki/SALT".to_string())
        );
    }

    #[test]
    fn test_screen_is_idempotent() {
        let screen = wiki_screen();
        let once = screen.screen(
            SOURCE,
            [
                "/wiki/A",
                "//en.wikipedia.org/wiki/B",
                "/wiki/C?x=1",
                "https://en.wikipedia.org/wiki/D",
            ],
        );
        let twice = screen.screen(SOURCE, once.iter());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_authority_with_port() {
        let screen = LinkScreen::new("http", "127.0.0.1:8080", "/wiki");
        let screened: Vec<String> = screen
            .screen("http://127.0.0.1:8080/wiki/Home", ["/wiki/Next", "/wiki/Home"])
            .into_iter()
            .collect();
        assert_eq!(screened, vec!["http://127.0.0.1:8080/wiki/Next"]);
    }

    #[test]
    fn test_from_config_uses_seed_origin() {
        let config = CrawlConfig {
            seed_url: "http://127.0.0.1:4000/wiki/Seed".to_string(),
            domain: None,
            article_path: "/wiki".to_string(),
            workers: 1,
            max_attempts: 5,
        };
        let screen = LinkScreen::from_config(&config).unwrap();
        assert_eq!(screen.origin(), "http://127.0.0.1:4000");
    }
}
