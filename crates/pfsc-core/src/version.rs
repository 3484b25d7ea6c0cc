use crate::{PECode, PfscError};
use std::cmp::Ordering;
use std::fmt;

/// The tag used for work-in-progress content (mutable, always re-read from
/// disk under the `TIME` cache policy).
pub const WIP_TAG: &str = "WIP";

/// The tag used to mean "the highest major version known", e.g. when
/// resolving a dependency that should always track the latest release.
pub const INF_TAG: &str = "INF";

/// A module/repo version: either work-in-progress, or a released
/// `vMAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Wip,
    Numbered { major: u32, minor: u32, patch: u32 },
}

impl Version {
    pub fn parse(s: &str) -> Result<Version, PfscError> {
        if s == WIP_TAG {
            return Ok(Version::Wip);
        }
        let rest = s.strip_prefix('v').ok_or_else(|| malformed(s))?;
        let mut parts = rest.split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(|| malformed(s))?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(|| malformed(s))?;
        let patch = parts.next().and_then(|p| p.parse().ok()).ok_or_else(|| malformed(s))?;
        if parts.next().is_some() {
            return Err(malformed(s));
        }
        Ok(Version::Numbered { major, minor, patch })
    }

    pub const fn is_wip(self) -> bool {
        matches!(self, Version::Wip)
    }

    /// The major version number, used as the `major` validity-interval bound
    /// in the graph index. WIP builds always use the sentinel 0, since WIP
    /// nodes are identified by `major == WIP` string matching in the original
    /// schema; here we keep WIP distinct at the type level instead and let
    /// callers special-case it.
    pub fn major(self) -> Option<u32> {
        match self {
            Version::Wip => None,
            Version::Numbered { major, .. } => Some(major),
        }
    }

    pub fn is_major_increment_of(self, other: Version) -> bool {
        match (self, other) {
            (Version::Numbered { major: a, .. }, Version::Numbered { major: b, .. }) => {
                a == b + 1
            }
            _ => false,
        }
    }

    pub fn is_major_zero(self) -> bool {
        matches!(self, Version::Numbered { minor: 0, patch: 0, .. })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Wip => f.write_str(WIP_TAG),
            Version::Numbered { major, minor, patch } => {
                write!(f, "v{major}.{minor}.{patch}")
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Version::Wip, Version::Wip) => Some(Ordering::Equal),
            (Version::Wip, _) => Some(Ordering::Greater),
            (_, Version::Wip) => Some(Ordering::Less),
            (
                Version::Numbered { major: a1, minor: a2, patch: a3 },
                Version::Numbered { major: b1, minor: b2, patch: b3 },
            ) => Some((a1, a2, a3).cmp(&(b1, b2, b3))),
        }
    }
}

fn malformed(s: &str) -> PfscError {
    PfscError::new(
        PECode::MalformedVersionTag,
        format!("malformed version tag: {s:?}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wip_and_numbered() {
        assert_eq!(Version::parse("WIP").unwrap(), Version::Wip);
        assert_eq!(
            Version::parse("v1.2.3").unwrap(),
            Version::Numbered { major: 1, minor: 2, patch: 3 }
        );
        assert!(Version::parse("1.2.3").is_err());
        assert!(Version::parse("v1.2").is_err());
    }

    #[test]
    fn wip_sorts_above_numbered() {
        let wip = Version::Wip;
        let v1 = Version::parse("v1.0.0").unwrap();
        assert!(wip > v1);
    }

    #[test]
    fn major_increment_detection() {
        let v1 = Version::parse("v1.0.0").unwrap();
        let v2 = Version::parse("v2.0.0").unwrap();
        assert!(v2.is_major_increment_of(v1));
        assert!(!v1.is_major_increment_of(v2));
    }
}
