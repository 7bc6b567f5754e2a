//! Semantic versions found in scan report metadata
//!
//! Reports carry two versions: the engine version that produced them
//! (`scanVersion`) and the report schema version (`scanReportVersion`).
//! The schema version selects decoding rules, so it is parsed strictly.
//! The engine version is informational and parsed leniently.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Version string is empty")]
    Empty,

    #[error("Invalid version '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

/// How many components take part in a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Compare major, minor and patch
    Full,
    /// Ignore the patch component
    MajorMinor,
}

/// A semantic version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(pub semver::Version);

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Strict parse of `major.minor[.patch]` with an optional leading `v`.
    ///
    /// Pre-release and build metadata are kept as `semver` reads them.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let padded = pad_major_minor(strip_v(trimmed));
        semver::Version::parse(&padded)
            .map(Self)
            .map_err(|e| VersionError::Invalid {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// Best-effort parse that drops pre-release and build suffixes
    /// (`1.2.3-beta`, `1.2.3+42`, `1.2rc1`) and falls back to `fallback`
    /// when nothing usable remains.
    pub fn parse_lenient(input: &str, fallback: Version) -> Version {
        let cleaned: String = strip_v(input.trim())
            .split(['-', '+', ' '])
            .next()
            .unwrap_or_default()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let cleaned = cleaned.trim_end_matches('.');

        if let Ok(version) = Self::parse(cleaned) {
            return version;
        }
        match cleaned.parse::<u64>() {
            Ok(major) => Self::new(major, 0, 0),
            Err(_) => {
                tracing::debug!(input, %fallback, "Unparseable version, using fallback");
                fallback
            }
        }
    }

    /// Compare two versions at the given precision
    pub fn compare(&self, other: &Version, precision: Precision) -> Ordering {
        match precision {
            Precision::Full => self.cmp(other),
            Precision::MajorMinor => {
                (self.0.major, self.0.minor).cmp(&(other.0.major, other.0.minor))
            }
        }
    }

    /// `true` when `self >= minimum` at the given precision
    pub fn at_least(&self, minimum: &Version, precision: Precision) -> bool {
        self.compare(minimum, precision) != Ordering::Less
    }
}

fn strip_v(input: &str) -> &str {
    input
        .strip_prefix('v')
        .or_else(|| input.strip_prefix('V'))
        .unwrap_or(input)
}

/// `2.1` becomes `2.1.0`; anything else is passed through untouched.
fn pad_major_minor(input: &str) -> String {
    let core_end = input.find(['-', '+']).unwrap_or(input.len());
    let (core, rest) = input.split_at(core_end);
    if core.matches('.').count() == 1 {
        format!("{}.0{}", core, rest)
    } else {
        input.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<semver::Version> for Version {
    fn from(version: semver::Version) -> Self {
        Self(version)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_and_short_forms() {
        assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("2.0").unwrap(), Version::new(2, 0, 0));
        assert_eq!(Version::parse("v3.1.4").unwrap(), Version::new(3, 1, 4));
    }

    #[test]
    fn test_parse_keeps_prerelease() {
        let version = Version::parse("2.1-beta.1").unwrap();
        assert_eq!((version.0.major, version.0.minor, version.0.patch), (2, 1, 0));
        assert_eq!(version.0.pre.as_str(), "beta.1");
        assert!(version < Version::new(2, 1, 0));
        assert_eq!(
            version.compare(&Version::new(2, 1, 0), Precision::MajorMinor),
            Ordering::Equal
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Version::parse(""), Err(VersionError::Empty));
        assert!(matches!(
            Version::parse("1"),
            Err(VersionError::Invalid { .. })
        ));
        assert!(Version::parse("1.x.3").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("two").is_err());
    }

    #[test]
    fn test_lenient_strips_suffixes() {
        let fallback = Version::new(1, 0, 0);
        assert_eq!(
            Version::parse_lenient("1.2.3-beta", fallback.clone()),
            Version::new(1, 2, 3)
        );
        assert_eq!(
            Version::parse_lenient("2.4.1+build.7", fallback.clone()),
            Version::new(2, 4, 1)
        );
        assert_eq!(
            Version::parse_lenient("1.9rc2", fallback.clone()),
            Version::new(1, 9, 0)
        );
        assert_eq!(
            Version::parse_lenient("3", fallback.clone()),
            Version::new(3, 0, 0)
        );
        assert_eq!(Version::parse_lenient("nightly", fallback.clone()), fallback);
    }

    #[test]
    fn test_major_minor_precision_ignores_patch() {
        let a = Version::new(2, 0, 9);
        let b = Version::new(2, 0, 0);
        assert_eq!(a.compare(&b, Precision::MajorMinor), Ordering::Equal);
        assert_eq!(a.compare(&b, Precision::Full), Ordering::Greater);
        assert!(!Version::new(1, 9, 99).at_least(&b, Precision::MajorMinor));
        assert!(b.at_least(&Version::new(2, 0, 5), Precision::MajorMinor));
        assert!(!b.at_least(&Version::new(2, 0, 5), Precision::Full));
    }

    #[test]
    fn test_serde_as_string() {
        let version = Version::new(1, 4, 2);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.4.2\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);

        let pre: Version = serde_json::from_str("\"2.0.0-rc.1\"").unwrap();
        assert_eq!(serde_json::to_string(&pre).unwrap(), "\"2.0.0-rc.1\"");
    }
}
