//! Route-to-module detection and path matching.
//!
//! Module routes look like `/dashboard/<segment>/<module-key>/...` where
//! `<segment>` is the reserved namespace segment (`modules` by default).

pub const DEFAULT_MODULE_SEGMENT: &str = "modules";

/// How a registered path relates to the current route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    Exact,
    /// Registered path is an ancestor of the route, `depth` segments deep
    Prefix { depth: usize },
    None,
}

impl PathMatch {
    fn rank(&self) -> Option<(u8, usize)> {
        match self {
            PathMatch::Exact => Some((1, 0)),
            PathMatch::Prefix { depth } => Some((0, *depth)),
            PathMatch::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDetector {
    segment: String,
}

impl Default for RouteDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_SEGMENT)
    }
}

impl RouteDetector {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into().trim_matches('/').to_string(),
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The segment right after the reserved one, whether or not it names a
    /// registered module.
    pub fn module_segment(&self, path: &str) -> Option<String> {
        let normalized = normalize_path(path);
        let mut segments = segments(&normalized);
        segments.find(|segment| *segment == self.segment)?;
        segments.next().map(str::to_string)
    }
}

/// Drops query and fragment, collapses repeated slashes and strips the
/// trailing one.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let joined = path[..end]
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('/').filter(|segment| !segment.is_empty())
}

/// Compares on segment boundaries: `/m/hr` is a prefix of `/m/hr/users`
/// but not of `/m/hr-admin`.
pub fn match_path(registered: &str, route: &str) -> PathMatch {
    let registered = normalize_path(registered);
    let route = normalize_path(route);

    if registered == route {
        return PathMatch::Exact;
    }

    let depth = segments(&registered).count();
    if registered == "/" {
        return PathMatch::Prefix { depth };
    }

    match route.strip_prefix(registered.as_str()) {
        Some(rest) if rest.starts_with('/') => PathMatch::Prefix { depth },
        _ => PathMatch::None,
    }
}

/// Picks the candidate that owns `route`: an exact match wins, then the
/// deepest prefix. Ties keep the earliest candidate.
pub fn best_match<'a, T, I>(candidates: I, route: &str) -> Option<T>
where
    I: IntoIterator<Item = (&'a str, T)>,
{
    let mut best: Option<((u8, usize), T)> = None;
    for (path, candidate) in candidates {
        let Some(rank) = match_path(path, route).rank() else {
            continue;
        };
        if best.as_ref().map_or(true, |(current, _)| rank > *current) {
            best = Some((rank, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes_query_and_fragment() {
        assert_eq!(normalize_path("/dashboard//modules/hr/"), "/dashboard/modules/hr");
        assert_eq!(normalize_path("dashboard/modules/hr?tab=2#top"), "/dashboard/modules/hr");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn finds_the_segment_after_the_reserved_one() {
        let detector = RouteDetector::default();
        assert_eq!(detector.module_segment("/dashboard/modules/hr"), Some("hr".into()));
        assert_eq!(detector.module_segment("/dashboard/modules/hr/users/"), Some("hr".into()));
        assert_eq!(detector.module_segment("/dashboard/modules"), None);
        assert_eq!(detector.module_segment("/dashboard/settings"), None);
    }

    #[test]
    fn custom_segment() {
        let detector = RouteDetector::new("/apps/");
        assert_eq!(detector.segment(), "apps");
        assert_eq!(detector.module_segment("/apps/payroll/runs"), Some("payroll".into()));
        assert_eq!(detector.module_segment("/dashboard/modules/hr"), None);
    }

    #[test]
    fn prefix_matches_respect_segment_boundaries() {
        assert_eq!(match_path("/dashboard/modules/hr", "/dashboard/modules/hr/"), PathMatch::Exact);
        assert_eq!(
            match_path("/dashboard/modules/hr", "/dashboard/modules/hr/users"),
            PathMatch::Prefix { depth: 3 }
        );
        assert_eq!(match_path("/dashboard/modules/hr", "/dashboard/modules/hr-admin"), PathMatch::None);
        assert_eq!(match_path("/", "/anything"), PathMatch::Prefix { depth: 0 });
    }

    #[test]
    fn exact_beats_prefix_and_deeper_prefix_beats_shallower() {
        let candidates = [
            ("/dashboard", "dashboard"),
            ("/dashboard/modules/hr", "hr"),
            ("/dashboard/modules/hr/users", "users"),
            ("/dashboard/modules/hr-admin", "hr-admin"),
        ];

        assert_eq!(best_match(candidates, "/dashboard/modules/hr"), Some("hr"));
        assert_eq!(best_match(candidates, "/dashboard/modules/hr/users/42"), Some("users"));
        assert_eq!(best_match(candidates, "/dashboard/modules/hr-admin"), Some("hr-admin"));
        assert_eq!(best_match(candidates, "/dashboard/settings"), Some("dashboard"));
        assert_eq!(best_match(candidates, "/login"), None);
    }
}
