//! URL routing table: classifies every source URL before any loader runs.

use url::Url;

/// How a URL should be loaded, decided once per URL per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Never fetched; recorded as a failure with reason "skipped".
    Skip,
    /// Same-domain breadth-first crawl, `depth` hops out from the seed.
    Recursive {
        /// Maximum hop distance from the seed page.
        depth: u32,
    },
    /// Always loaded through the rendering service.
    ForceRender,
    /// Static loader with content-type dispatch.
    Default,
}

/// A non-fatal problem found while parsing a routing config line.
///
/// The parser collects these instead of logging so callers own the log
/// output and tests can assert on them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// Which config list the line came from.
    pub list: &'static str,
    /// The offending line, trimmed.
    pub line: String,
    /// What was wrong with it.
    pub message: String,
}

/// Merged skip / force-render / recursive-crawl configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    skip_domains: Vec<String>,
    recursive_domains: Vec<(String, u32)>,
    render_domains: Vec<String>,
}

impl RoutingTable {
    /// Builds a table from the contents of the three config files.
    ///
    /// Malformed lines are skipped and reported as warnings, never fatal.
    /// Reading the files (and deciding that a missing file aborts the run)
    /// is the caller's job.
    pub fn from_sources(skip: &str, render: &str, recursive: &str) -> (Self, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let skip_domains = parse_domain_list(skip, "skip", &mut warnings);
        let render_domains = parse_domain_list(render, "force-render", &mut warnings);
        let recursive_domains = parse_recursive_list(recursive, &mut warnings);
        let table = Self {
            skip_domains,
            recursive_domains,
            render_domains,
        };
        (table, warnings)
    }

    /// Classifies a URL. Priority: skip, then recursive, then force-render,
    /// then default. Matching is case-insensitive and domain-suffix based,
    /// so `docs.example.com` matches a listed `example.com`.
    pub fn classify(&self, url: &str) -> RoutingDecision {
        let Some(host) = url_host(url) else {
            // Unparseable URLs fall through to the default loader, which
            // reports them as invalid without consulting the network.
            return RoutingDecision::Default;
        };
        if self.skip_domains.iter().any(|d| domain_matches(&host, d)) {
            return RoutingDecision::Skip;
        }
        if let Some((_, depth)) = self
            .recursive_domains
            .iter()
            .find(|(d, _)| domain_matches(&host, d))
        {
            return RoutingDecision::Recursive { depth: *depth };
        }
        if self.render_domains.iter().any(|d| domain_matches(&host, d)) {
            return RoutingDecision::ForceRender;
        }
        RoutingDecision::Default
    }
}

fn parse_domain_list(
    contents: &str,
    list: &'static str,
    warnings: &mut Vec<ParseWarning>,
) -> Vec<String> {
    let mut domains = Vec::new();
    for line in config_lines(contents) {
        match normalize_domain(line) {
            Some(domain) => domains.push(domain),
            None => warnings.push(ParseWarning {
                list,
                line: line.to_string(),
                message: "not a domain or URL".to_string(),
            }),
        }
    }
    domains
}

fn parse_recursive_list(contents: &str, warnings: &mut Vec<ParseWarning>) -> Vec<(String, u32)> {
    let mut entries = Vec::new();
    for line in config_lines(contents) {
        let mut parts = line.split_whitespace();
        let target = parts.next().unwrap_or_default();
        let Some(domain) = normalize_domain(target) else {
            warnings.push(ParseWarning {
                list: "recursive",
                line: line.to_string(),
                message: "not a domain or URL".to_string(),
            });
            continue;
        };
        let depth = match parts.next() {
            None => {
                warnings.push(ParseWarning {
                    list: "recursive",
                    line: line.to_string(),
                    message: "missing depth, defaulting to 1".to_string(),
                });
                1
            }
            Some(raw) => match raw.parse::<i64>() {
                Ok(depth) if depth < 0 => {
                    warnings.push(ParseWarning {
                        list: "recursive",
                        line: line.to_string(),
                        message: "negative depth clamped to 0".to_string(),
                    });
                    0
                }
                Ok(depth) => depth.min(i64::from(u32::MAX)) as u32,
                Err(_) => {
                    warnings.push(ParseWarning {
                        list: "recursive",
                        line: line.to_string(),
                        message: "depth is not an integer, defaulting to 1".to_string(),
                    });
                    1
                }
            },
        };
        entries.push((domain, depth));
    }
    entries
}

fn config_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Accepts either a bare domain or a full URL; returns the lowercased host.
fn normalize_domain(entry: &str) -> Option<String> {
    if let Ok(url) = Url::parse(entry) {
        if let Some(host) = url.host_str() {
            return Some(host.to_ascii_lowercase());
        }
    }
    // Bare domains do not parse as URLs; retry with a scheme attached.
    let entry = entry.trim_end_matches('/');
    if entry.is_empty() || entry.contains('/') || entry.contains(char::is_whitespace) {
        return None;
    }
    Url::parse(&format!("https://{entry}"))
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
}

fn url_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Suffix match on label boundaries: `docs.example.com` matches
/// `example.com`, `notexample.com` does not.
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
