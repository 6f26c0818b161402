use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(Identity);
string_newtype!(ProblemNumber);

impl Identity {
    /// Time-based identity: milliseconds since the Unix epoch.
    pub fn generate_at(now: DateTime<Utc>) -> Self {
        Self(now.timestamp_millis().to_string())
    }
}

impl ProblemNumber {
    pub const CATALOG: [&'static str; 3] = ["001", "002", "003"];

    /// Looks `input` up in the catalog, accepting unpadded numbers (`2`).
    pub fn from_catalog(input: &str) -> Option<Self> {
        let number: u16 = input.trim().parse().ok()?;
        let padded = format!("{number:03}");
        Self::CATALOG
            .contains(&padded.as_str())
            .then(|| Self(padded))
    }
}

impl Default for ProblemNumber {
    fn default() -> Self {
        Self(Self::CATALOG[0].to_string())
    }
}

/// Signed-in account, restored from persisted client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    TransportError,
}
