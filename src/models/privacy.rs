use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility tier stored on every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privacy {
    Public,
    Unlisted,
    Hidden,
    Private,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "PUBLIC",
            Privacy::Unlisted => "UNLISTED",
            Privacy::Hidden => "HIDDEN",
            Privacy::Private => "PRIVATE",
        }
    }

    /// Lenient decoding for stored values: anything unknown is the most
    /// restrictive tier.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or(Privacy::Private)
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPrivacy(pub String);

impl fmt::Display for UnknownPrivacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown privacy level '{}'", self.0)
    }
}

impl FromStr for Privacy {
    type Err = UnknownPrivacy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Privacy::Public),
            "UNLISTED" => Ok(Privacy::Unlisted),
            "HIDDEN" => Ok(Privacy::Hidden),
            "PRIVATE" => Ok(Privacy::Private),
            _ => Err(UnknownPrivacy(s.to_string())),
        }
    }
}
