use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DeploymentTag
// ---------------------------------------------------------------------------

/// The live/canary selector carried on every engine RPC.
///
/// The server runs two parallel deployments; a request tagged with anything
/// other than the currently served tag is rejected with a distinguished
/// error. Input is case-insensitive (`"Blue"`, `"BLUE"`, `"blue"` all parse);
/// the wire rendering is always lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTag {
    Blue,
    Green,
}

impl DeploymentTag {
    /// Discovery probes tags in this fixed order.
    pub const DISCOVERY_ORDER: [DeploymentTag; 2] = [DeploymentTag::Blue, DeploymentTag::Green];

    /// Lower-case wire rendering (`"blue"` / `"green"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentTag::Blue => "blue",
            DeploymentTag::Green => "green",
        }
    }
}

impl fmt::Display for DeploymentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The input was neither `blue` nor `green` (any case).
///
/// Callers treat this as "no usable tag" — the enclosing operation is never
/// aborted because a response carried garbage in its hint field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError {
    pub raw: String,
}

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized deployment tag: {:?}", self.raw)
    }
}

impl std::error::Error for ParseTagError {}

impl FromStr for DeploymentTag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(DeploymentTag::Blue),
            "green" => Ok(DeploymentTag::Green),
            _ => Err(ParseTagError { raw: s.to_string() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("blue".parse::<DeploymentTag>(), Ok(DeploymentTag::Blue));
        assert_eq!("Blue".parse::<DeploymentTag>(), Ok(DeploymentTag::Blue));
        assert_eq!("GREEN".parse::<DeploymentTag>(), Ok(DeploymentTag::Green));
        assert_eq!(" green ".parse::<DeploymentTag>(), Ok(DeploymentTag::Green));
    }

    #[test]
    fn parse_rejects_garbage_without_panicking() {
        let err = "purple".parse::<DeploymentTag>().unwrap_err();
        assert_eq!(err.raw, "purple");
    }

    #[test]
    fn wire_rendering_is_lowercase() {
        assert_eq!(DeploymentTag::Blue.to_string(), "blue");
        assert_eq!(DeploymentTag::Green.as_str(), "green");
    }
}
