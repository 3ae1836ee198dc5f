//! Member presence tracking for JSON:API objects.
//!
//! Each object kind the reader parses has a state that observes member names
//! as they stream past, rejects a repeated member on sight, and checks the
//! required-member rules once the object closes.

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};

use crate::error::{FormatError, Scope};

/// A JSON object key, borrowed from the input when possible
pub(crate) struct MemberName<'de>(Cow<'de, str>);

impl MemberName<'_> {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MemberName<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NameVisitor;

        impl<'de> Visitor<'de> for NameVisitor {
            type Value = MemberName<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a member name")
            }

            fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> Result<Self::Value, E> {
                Ok(MemberName(Cow::Borrowed(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(MemberName(Cow::Owned(v.to_string())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(MemberName(Cow::Owned(v)))
            }
        }

        deserializer.deserialize_str(NameVisitor)
    }
}

/// Seen-set over an object's members
struct Presence {
    scope: Scope,
    known: &'static [&'static str],
    seen: u16,
    others: Vec<String>,
}

impl Presence {
    const fn new(scope: Scope, known: &'static [&'static str]) -> Self {
        Self {
            scope,
            known,
            seen: 0,
            others: Vec::new(),
        }
    }

    fn observe(&mut self, name: &str) -> Result<(), FormatError> {
        let repeated = match self.known.iter().position(|known| *known == name) {
            Some(index) => {
                let bit = 1u16 << index;
                let repeated = self.seen & bit != 0;
                self.seen |= bit;
                repeated
            }
            None => {
                let repeated = self.others.iter().any(|other| other == name);
                if !repeated {
                    self.others.push(name.to_string());
                }
                repeated
            }
        };
        if repeated {
            return Err(FormatError::DuplicateMember {
                scope: self.scope,
                member: name.to_string(),
            });
        }
        Ok(())
    }

    fn has(&self, name: &str) -> bool {
        self.known
            .iter()
            .position(|known| *known == name)
            .is_some_and(|index| self.seen & (1u16 << index) != 0)
    }
}

macro_rules! presence_state {
    ($(#[$doc:meta])* $name:ident, $scope:expr, [$($member:literal),+ $(,)?]) => {
        $(#[$doc])*
        pub(crate) struct $name(Presence);

        impl $name {
            pub(crate) fn new() -> Self {
                Self(Presence::new($scope, &[$($member),+]))
            }

            pub(crate) fn observe(&mut self, name: &str) -> Result<(), FormatError> {
                self.0.observe(name)
            }

            pub(crate) fn has(&self, name: &str) -> bool {
                self.0.has(name)
            }
        }
    };
}

presence_state!(
    /// Top-level document members
    DocumentState,
    Scope::Document,
    ["data", "errors", "meta", "jsonapi", "links", "included"]
);

presence_state!(
    ResourceState,
    Scope::Resource,
    ["id", "type", "attributes", "relationships", "links", "meta"]
);

presence_state!(
    IdentifierState,
    Scope::Identifier,
    ["id", "type", "meta"]
);

presence_state!(
    RelationshipState,
    Scope::Relationship,
    ["data", "links", "meta"]
);

presence_state!(
    ErrorState,
    Scope::Error,
    ["id", "links", "status", "code", "title", "detail", "source", "meta"]
);

impl DocumentState {
    pub(crate) fn validate(&self) -> Result<(), FormatError> {
        let (data, errors) = (self.has("data"), self.has("errors"));
        if data && errors {
            return Err(FormatError::DataAndErrors);
        }
        if !data && !errors && !self.has("meta") {
            return Err(FormatError::MissingTopLevelMember);
        }
        if self.has("included") && !data {
            return Err(FormatError::IncludedWithoutData);
        }
        Ok(())
    }
}

impl ResourceState {
    pub(crate) fn validate(&self) -> Result<(), FormatError> {
        if !self.has("type") {
            return Err(FormatError::MissingType {
                scope: Scope::Resource,
            });
        }
        Ok(())
    }
}

impl IdentifierState {
    pub(crate) fn validate(&self) -> Result<(), FormatError> {
        if !self.has("type") {
            return Err(FormatError::MissingType {
                scope: Scope::Identifier,
            });
        }
        if !self.has("id") {
            return Err(FormatError::MissingId {
                scope: Scope::Identifier,
            });
        }
        Ok(())
    }
}

impl RelationshipState {
    pub(crate) fn validate(&self, relationship: &str) -> Result<(), FormatError> {
        if !self.has("data") && !self.has("links") && !self.has("meta") {
            return Err(FormatError::EmptyRelationship {
                relationship: relationship.to_string(),
            });
        }
        Ok(())
    }
}
