//! Validated name newtypes with case-insensitive equality.
//!
//! Each name type wraps a non-empty trimmed string. A `ModuleName` cannot be
//! accidentally used where a `ColumnName` is expected, and every comparison,
//! hash, and ordering goes through an ASCII case fold.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Rejected name value.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{kind} name must be a non-empty string")]
pub struct NameError {
    pub kind: &'static str,
}

macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            raw: String,
            folded: String,
        }

        impl $name {
            /// Validate and wrap a raw name. Surrounding whitespace is trimmed.
            pub fn new(raw: impl Into<String>) -> Result<Self, NameError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(NameError { kind: $kind });
                }
                Ok(Self {
                    folded: trimmed.to_ascii_lowercase(),
                    raw: trimmed.to_string(),
                })
            }

            /// The name exactly as supplied (trimmed).
            pub fn as_str(&self) -> &str {
                &self.raw
            }

            /// The case-folded comparison key.
            pub fn folded(&self) -> &str {
                &self.folded
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.folded == other.folded
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.folded.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.folded.cmp(&other.folded)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.raw)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_name!(
    /// Logical module name.
    ModuleName,
    "module"
);

define_name!(
    /// Logical entity name.
    EntityName,
    "entity"
);

define_name!(
    /// Physical table name.
    TableName,
    "table"
);

define_name!(
    /// Physical schema name.
    SchemaName,
    "schema"
);

define_name!(
    /// Logical attribute name.
    AttributeName,
    "attribute"
);

define_name!(
    /// Physical column name.
    ColumnName,
    "column"
);

impl SchemaName {
    /// The conventional default schema.
    pub fn dbo() -> Self {
        Self {
            raw: "dbo".to_string(),
            folded: "dbo".to_string(),
        }
    }
}
