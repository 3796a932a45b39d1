use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Logical namespace selecting a physical storage root
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ServiceType {
    Tts,
    Face2Face,
    Default,
}

impl ServiceType {
    /// Unknown or empty names resolve to `Default`
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "tts" => ServiceType::Tts,
            "face2face" => ServiceType::Face2Face,
            _ => ServiceType::Default,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceType::Tts => "tts",
            ServiceType::Face2Face => "face2face",
            ServiceType::Default => "default",
        }
    }
}

impl From<String> for ServiceType {
    fn from(raw: String) -> Self {
        ServiceType::parse(&raw)
    }
}

impl From<Option<&str>> for ServiceType {
    fn from(raw: Option<&str>) -> Self {
        raw.map(ServiceType::parse).unwrap_or(ServiceType::Default)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of mirroring one local file to the remote tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub service_type: ServiceType,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_service_type_is_default() {
        assert_eq!(ServiceType::parse("tts"), ServiceType::Tts);
        assert_eq!(ServiceType::parse("face2face"), ServiceType::Face2Face);
        assert_eq!(ServiceType::parse("video"), ServiceType::Default);
        assert_eq!(ServiceType::parse(""), ServiceType::Default);
        assert_eq!(ServiceType::from(None), ServiceType::Default);

        let parsed: ServiceType = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(parsed, ServiceType::Default);
        assert_eq!(serde_json::to_string(&ServiceType::Face2Face).unwrap(), "\"face2face\"");
    }
}
