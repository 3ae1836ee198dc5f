//! The top-level `jsonapi` object and version checks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Meta;
use crate::error::FormatError;

/// A parsed `jsonapi.version` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsonApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl JsonApiVersion {
    pub const V1_0: JsonApiVersion = JsonApiVersion { major: 1, minor: 0 };
    pub const V1_1: JsonApiVersion = JsonApiVersion { major: 1, minor: 1 };

    /// The lowest version this codec accepts
    pub const MINIMUM: JsonApiVersion = Self::V1_0;

    /// Parse and check against [`JsonApiVersion::MINIMUM`]
    pub fn parse_supported(s: &str) -> Result<Self, FormatError> {
        let version: JsonApiVersion = s.parse()?;
        if version < Self::MINIMUM {
            return Err(FormatError::UnsupportedVersion {
                version: s.to_string(),
            });
        }
        Ok(version)
    }
}

impl FromStr for JsonApiVersion {
    type Err = FormatError;

    /// Accepts two to four dot-separated numeric components; only the first two
    /// take part in comparisons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatError::InvalidVersion {
            version: s.to_string(),
        };
        let mut components = Vec::with_capacity(4);
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            components.push(part.parse::<u32>().map_err(|_| invalid())?);
        }
        if !(2..=4).contains(&components.len()) {
            return Err(invalid());
        }
        Ok(JsonApiVersion {
            major: components[0],
            minor: components[1],
        })
    }
}

impl fmt::Display for JsonApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Describes the server's implementation of JSON:API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl JsonApiObject {
    pub fn new(version: JsonApiVersion) -> Self {
        Self {
            version: Some(version.to_string()),
            ..Self::default()
        }
    }

    /// Check `version`, when present, is a supported version string
    pub fn validate(&self) -> Result<(), FormatError> {
        if let Some(version) = &self.version {
            JsonApiVersion::parse_supported(version)?;
        }
        Ok(())
    }

    pub fn parsed_version(&self) -> Option<Result<JsonApiVersion, FormatError>> {
        self.version.as_deref().map(JsonApiVersion::parse_supported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1.0".parse::<JsonApiVersion>().unwrap(), JsonApiVersion::V1_0);
        assert_eq!("1.1".parse::<JsonApiVersion>().unwrap(), JsonApiVersion::V1_1);
        assert_eq!(
            "2.3.4".parse::<JsonApiVersion>().unwrap(),
            JsonApiVersion { major: 2, minor: 3 }
        );
        assert!("1".parse::<JsonApiVersion>().is_err());
        assert!("".parse::<JsonApiVersion>().is_err());
        assert!("1.0.0.0.0".parse::<JsonApiVersion>().is_err());
        assert!("v1.0".parse::<JsonApiVersion>().is_err());
    }

    #[test]
    fn test_version_below_minimum() {
        let err = JsonApiVersion::parse_supported("0.9").unwrap_err();
        assert!(err.to_string().contains("minimum required"));
    }

    #[test]
    fn test_version_invalid() {
        let err = JsonApiVersion::parse_supported("1.#.0").unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_object_validation() {
        assert!(JsonApiObject::default().validate().is_ok());
        assert!(JsonApiObject::new(JsonApiVersion::V1_1).validate().is_ok());
        let object = JsonApiObject {
            version: Some("0.1".to_string()),
            ..JsonApiObject::default()
        };
        assert!(matches!(
            object.validate(),
            Err(FormatError::UnsupportedVersion { .. })
        ));
    }
}
