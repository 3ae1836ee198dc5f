//! The top-level `errors` member

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use tracing::trace;

use super::context::{DecodeContext, next_optional_string, reject_scalars};
use crate::error::{FormatError, Scope};
use crate::model::ErrorObject;
use crate::validation::{ErrorState, MemberName};

/// Reads a non-empty array of error objects
pub(crate) struct ErrorsSeed<'c, 'o> {
    pub(crate) ctx: &'c mut DecodeContext<'o>,
}

impl ErrorsSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "errors".to_string(),
            expected: "an array of error objects",
        })
    }
}

impl<'de> DeserializeSeed<'de> for ErrorsSeed<'_, '_> {
    type Value = Vec<ErrorObject>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ErrorsSeed<'_, '_> {
    type Value = Vec<ErrorObject>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an errors array")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.unexpected())
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let mut errors = Vec::new();
        while let Some(error) = seq.next_element_seed(ErrorObjectSeed { ctx: &mut *ctx })? {
            errors.push(error);
        }
        if errors.is_empty() {
            return Err(ctx.fail(FormatError::EmptyErrors));
        }
        Ok(errors)
    }
}

struct ErrorObjectSeed<'c, 'o> {
    ctx: &'c mut DecodeContext<'o>,
}

impl ErrorObjectSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "errors".to_string(),
            expected: "an array of error objects",
        })
    }
}

impl<'de> DeserializeSeed<'de> for ErrorObjectSeed<'_, '_> {
    type Value = ErrorObject;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ErrorObjectSeed<'_, '_> {
    type Value = ErrorObject;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an error object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.unexpected())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let mut state = ErrorState::new();
        let mut error = ErrorObject::default();

        while let Some(name) = map.next_key::<MemberName<'de>>()? {
            state
                .observe(name.as_str())
                .map_err(|err| ctx.fail::<A::Error>(err))?;
            match name.as_str() {
                "id" => error.id = next_optional_string(&mut map, ctx, Scope::Error, "id")?,
                "status" => error.status = next_optional_string(&mut map, ctx, Scope::Error, "status")?,
                "code" => error.code = next_optional_string(&mut map, ctx, Scope::Error, "code")?,
                "title" => error.title = next_optional_string(&mut map, ctx, Scope::Error, "title")?,
                "detail" => error.detail = next_optional_string(&mut map, ctx, Scope::Error, "detail")?,
                "links" => error.links = map.next_value()?,
                "source" => error.source = map.next_value()?,
                "meta" => error.meta = map.next_value()?,
                other => {
                    trace!(member = other, "Skipping unknown error object member");
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(error)
    }
}
