//! Version resolution for packages.
//!
//! Tags are matched against a constraint with the `semver` crate. Tags that
//! are not semver (after dropping a leading `v` and padding missing minor or
//! patch numbers) can only be selected by exact name.

use semver::{Version, VersionReq};
use std::cmp::Ordering;

use crate::registry::Tag;

/// Version resolver - pure functions over a package's tags.
pub struct VersionResolver;

impl VersionResolver {
    /// Select the tag that best satisfies `constraint`.
    ///
    /// - `*`, `latest` or empty: the highest stable version
    /// - an exact tag name (with or without a leading `v`)
    /// - a full version that is not tagged: no match
    /// - otherwise a range such as `~1.2`, `^2.0.0`, `>=1.0 <2.0`, `1.0 - 2`
    ///   or `^1 || ^2`,
    ///   resolved to the highest matching version
    pub fn resolve<'a>(tags: &'a [Tag], constraint: &str) -> Option<&'a Tag> {
        let constraint = constraint.trim();
        if Self::is_wildcard(constraint) {
            return Self::find_latest(tags);
        }
        if let Some(tag) = Self::find_exact(tags, constraint) {
            return Some(tag);
        }
        if Self::is_full_version(constraint) {
            return None;
        }
        Self::find_matching(tags, constraint)
    }

    /// Find a tag with exact version match.
    ///
    /// Supports matching with or without 'v' prefix (e.g., "1.0.0" matches "v1.0.0").
    pub fn find_exact<'a>(tags: &'a [Tag], version: &str) -> Option<&'a Tag> {
        tags.iter().find(|t| Self::versions_match(&t.name, version))
    }

    /// Highest stable version, then highest pre-release, then the first tag listed.
    pub fn find_latest(tags: &[Tag]) -> Option<&Tag> {
        let versioned = Self::versioned(tags);
        versioned
            .iter()
            .filter(|(v, _)| v.pre.is_empty())
            .max_by(|a, b| a.0.cmp(&b.0))
            .or_else(|| versioned.iter().max_by(|a, b| a.0.cmp(&b.0)))
            .map(|(_, t)| *t)
            .or_else(|| tags.first())
    }

    /// Highest tag matching any alternative of a range.
    pub fn find_matching<'a>(tags: &'a [Tag], range: &str) -> Option<&'a Tag> {
        let reqs = Self::parse_range(range);
        if reqs.is_empty() {
            return None;
        }
        Self::versioned(tags)
            .into_iter()
            .filter(|(v, _)| reqs.iter().any(|r| r.matches(v)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, t)| t)
    }

    /// Whether an installed version satisfies a constraint.
    pub fn satisfies(version: &str, constraint: &str) -> bool {
        let constraint = constraint.trim();
        if Self::is_wildcard(constraint) || Self::versions_match(version, constraint) {
            return true;
        }
        if Self::is_full_version(constraint) {
            return false;
        }
        match Self::parse_version(version) {
            Some(v) => Self::parse_range(constraint).iter().any(|r| r.matches(&v)),
            None => false,
        }
    }

    /// Tag names, newest semver first; non-semver tags follow in listed order.
    pub fn available_versions(tags: &[Tag]) -> Vec<String> {
        let mut names: Vec<(Option<Version>, &str)> = tags
            .iter()
            .map(|t| (Self::parse_version(&t.name), t.name.as_str()))
            .collect();
        names.sort_by(|a, b| match (&a.0, &b.0) {
            (Some(va), Some(vb)) => vb.cmp(va),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        names.into_iter().map(|(_, n)| n.to_string()).collect()
    }

    /// Parse a tag name as a version: "v1.2" -> 1.2.0.
    pub fn parse_version(tag: &str) -> Option<Version> {
        let tag = tag.trim();
        let tag = tag.strip_prefix('v').unwrap_or(tag);
        if let Ok(v) = Version::parse(tag) {
            return Some(v);
        }
        let (core, rest) = match tag.find(['-', '+']) {
            Some(idx) => tag.split_at(idx),
            None => (tag, ""),
        };
        let parts = core.split('.').count();
        if core.is_empty() || parts >= 3 {
            return None;
        }
        let padded = format!("{}{}{}", core, ".0".repeat(3 - parts), rest);
        Version::parse(&padded).ok()
    }

    fn parse_range(range: &str) -> Vec<VersionReq> {
        range
            .split("||")
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .filter_map(|alt| VersionReq::parse(&Self::normalize_comparators(alt)).ok())
            .collect()
    }

    /// Rewrites a comparator set into `semver` syntax.
    ///
    /// - hyphen ranges: `1.9.1 - 3` -> `>=1.9.1, <=3`
    /// - space-separated comparators: `>= 1.9.1 <2.0.0` -> `>=1.9.1, <2.0.0`
    fn normalize_comparators(set: &str) -> String {
        if let Some((start, end)) = set.split_once(" - ") {
            let (start, end) = (start.trim(), end.trim());
            if !start.is_empty() && !end.is_empty() {
                return format!(">={}, <={}", start, end);
            }
        }
        if set.contains(',') {
            return set.to_string();
        }

        // An operator token without digits (`>=`) joins the version that follows it.
        let mut comparators = Vec::new();
        let mut pending = String::new();
        for token in set.split_whitespace() {
            pending.push_str(token);
            if token.chars().any(|c| c.is_ascii_digit() || matches!(c, 'x' | 'X' | '*')) {
                comparators.push(std::mem::take(&mut pending));
            }
        }
        if !pending.is_empty() {
            comparators.push(pending);
        }
        comparators.join(", ")
    }

    fn versioned(tags: &[Tag]) -> Vec<(Version, &Tag)> {
        tags.iter()
            .filter_map(|t| Self::parse_version(&t.name).map(|v| (v, t)))
            .collect()
    }

    fn is_full_version(constraint: &str) -> bool {
        Version::parse(constraint.strip_prefix('v').unwrap_or(constraint)).is_ok()
    }

    fn is_wildcard(constraint: &str) -> bool {
        matches!(constraint, "" | "*" | "latest")
    }

    fn versions_match(a: &str, b: &str) -> bool {
        a == b || a.trim_start_matches('v') == b.trim_start_matches('v')
    }
}
