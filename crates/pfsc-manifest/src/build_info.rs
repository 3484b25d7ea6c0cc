use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps and commit hash of the most recent build of one module,
/// together with whether that build was recursive (covered everything
/// under the module) or just the module's own content.
///
/// `time` is stored as free text (an RFC 3339 string when set via
/// [`BuildInfo::now`], but deserialized as-is from any existing manifest
/// JSON) rather than a typed timestamp, matching the original's `str(time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub time: String,
    pub recursive: bool,
}

impl BuildInfo {
    pub fn now(version: impl Into<String>, commit: impl Into<String>, recursive: bool) -> Self {
        BuildInfo {
            version: version.into(),
            commit: commit.into(),
            time: Utc::now().to_rfc3339(),
            recursive,
        }
    }

    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time).ok().map(|t| t.with_timezone(&Utc))
    }
}
