//! Strongly typed identifier wrappers.
//!
//! Identifiers in this domain are short human-readable codes (`"T11"`,
//! `"S1"`, a session code, an incident code), so every wrapper holds a
//! `String`.  They are `Ord + Hash` so they can be used as map keys and
//! sorted collection elements without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a `String`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[inline]
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
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id! {
    /// Identifier of a movable resource (vehicle), e.g. `"T11"`.
    pub struct ResourceId;
}

typed_id! {
    /// Identifier of a home station, e.g. `"S1"`.
    pub struct StationId;
}

typed_id! {
    /// Identifier of a shared simulation session (room).
    pub struct SessionId;
}

typed_id! {
    /// Identifier of an incident created on the shared map.
    pub struct IncidentId;
}
