//! Parsing and ordering of version name strings.

use std::cmp::Ordering;
use std::fmt;

/// A release's name, e.g. `"2.1.0"`, `"2.1.0-beta"` or `"2.1.0-experimental"`.
///
/// Invalid strings (anything that doesn't parse as `MAJOR.MINOR.PATCH` with an optional
/// `-experimental`/`-beta` suffix) are kept verbatim but flagged [`VersionName::is_valid`]
/// `false`; they compare equal only to themselves and sort after every valid name.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VersionName {
    name: String,
    major: u64,
    minor: u64,
    patch: u64,
    channel: Channel,
    valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
enum Channel {
    /// Sorts after Beta and Release: `PartialOrd` puts the smaller variant first, and
    /// experimental is the "least release-like" channel.
    Experimental,
    Beta,
    Release,
}

impl VersionName {
    /// Parses a version string. Never fails: unparseable input is retained as an invalid
    /// [`VersionName`] so callers can still display and reject it.
    pub fn parse(name: impl Into<String>) -> Self {
        let name = name.into();
        match Self::try_parse(&name) {
            Some((major, minor, patch, channel)) => Self {
                name,
                major,
                minor,
                patch,
                channel,
                valid: true,
            },
            None => Self {
                name,
                major: 0,
                minor: 0,
                patch: 0,
                channel: Channel::Release,
                valid: false,
            },
        }
    }

    fn try_parse(name: &str) -> Option<(u64, u64, u64, Channel)> {
        let (numeric, channel) = if let Some(stripped) = name.strip_suffix("-experimental") {
            (stripped, Channel::Experimental)
        } else if let Some(stripped) = name.strip_suffix("-beta") {
            (stripped, Channel::Beta)
        } else {
            (name, Channel::Release)
        };

        let mut parts = numeric.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((major, minor, patch, channel))
    }

    /// The original string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn is_experimental(&self) -> bool {
        self.channel == Channel::Experimental
    }

    pub fn is_beta(&self) -> bool {
        self.channel == Channel::Beta
    }

    /// `false` if the string wasn't `MAJOR.MINOR.PATCH[-experimental|-beta]`.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for VersionName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for VersionName {}

impl std::hash::Hash for VersionName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Descending order: greatest version first. Invalid names sort after every valid one, so a
/// registry sorted with this order never has to special-case them when looking for "latest".
impl Ord for VersionName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.valid, other.valid) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => return self.name.cmp(&other.name),
            (true, true) => {}
        }
        (other.major, other.minor, other.patch, other.channel)
            .cmp(&(self.major, self.minor, self.patch, self.channel))
    }
}

impl PartialOrd for VersionName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_release() {
        let v = VersionName::parse("2.1.0");
        assert!(v.is_valid());
        assert_eq!((v.major(), v.minor(), v.patch()), (2, 1, 0));
        assert!(!v.is_beta());
        assert!(!v.is_experimental());
    }

    #[test]
    fn parses_experimental_and_beta_suffixes() {
        let e = VersionName::parse("1.9.0-experimental");
        assert!(e.is_valid());
        assert!(e.is_experimental());

        let b = VersionName::parse("1.9.0-beta");
        assert!(b.is_valid());
        assert!(b.is_beta());
    }

    #[test]
    fn invalid_strings_are_retained_and_flagged() {
        let v = VersionName::parse("not-a-version");
        assert!(!v.is_valid());
        assert_eq!(v.as_str(), "not-a-version");
    }

    #[test]
    fn display_round_trips_original_string() {
        for s in ["2.1.0", "1.9.0-experimental", "weird garbage"] {
            let v = VersionName::parse(s);
            assert_eq!(v.to_string(), s);
        }
    }

    #[test]
    fn descending_order_by_numerics() {
        let mut versions = vec![
            VersionName::parse("1.0.0"),
            VersionName::parse("2.1.0"),
            VersionName::parse("2.0.1"),
        ];
        versions.sort();
        let names: Vec<_> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["2.1.0", "2.0.1", "1.0.0"]);
    }

    #[test]
    fn release_beats_beta_beats_experimental_at_equal_numerics() {
        let mut versions = vec![
            VersionName::parse("2.0.0-experimental"),
            VersionName::parse("2.0.0"),
            VersionName::parse("2.0.0-beta"),
        ];
        versions.sort();
        let names: Vec<_> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["2.0.0", "2.0.0-beta", "2.0.0-experimental"]);
    }

    #[test]
    fn invalid_names_sort_last() {
        let mut versions = vec![VersionName::parse("garbage"), VersionName::parse("1.0.0")];
        versions.sort();
        assert_eq!(versions[0].as_str(), "1.0.0");
        assert_eq!(versions[1].as_str(), "garbage");
    }

    #[test]
    fn equality_is_on_original_string_only() {
        assert_eq!(VersionName::parse("1.0.0"), VersionName::parse("1.0.0"));
        assert_ne!(VersionName::parse("1.0.0"), VersionName::parse("1.0.0-beta"));
    }
}
