use serde::de::{self, MapAccess};
use serde_json::Value;

use crate::error::{FormatError, JsonApiError, Scope};
use crate::options::CodecOptions;
use crate::tracker::DecodeTracker;

/// State threaded through every seed of one read.
///
/// serde only carries stringly errors across `Deserializer` boundaries, so a
/// failing seed stores the typed error here and hands serde a message-only
/// copy. The entry point returns the stored error when there is one.
pub(crate) struct DecodeContext<'o> {
    pub(crate) options: &'o CodecOptions,
    pub(crate) tracker: DecodeTracker,
    error: Option<JsonApiError>,
}

impl<'o> DecodeContext<'o> {
    pub(crate) fn new(options: &'o CodecOptions) -> Self {
        Self {
            options,
            tracker: DecodeTracker::new(),
            error: None,
        }
    }

    pub(crate) fn fail<E: de::Error>(&mut self, err: FormatError) -> E {
        let message = err.to_string();
        if self.error.is_none() {
            self.error = Some(err.into());
        }
        E::custom(message)
    }

    /// The typed error behind a failed read, or the parser's own error
    pub(crate) fn take_error(&mut self, fallback: serde_json::Error) -> JsonApiError {
        self.error.take().unwrap_or(JsonApiError::Json(fallback))
    }
}

/// Read a member value that must be a JSON string
pub(crate) fn next_string<'de, A: MapAccess<'de>>(
    map: &mut A,
    ctx: &mut DecodeContext<'_>,
    scope: Scope,
    member: &'static str,
) -> Result<String, A::Error> {
    match map.next_value::<Value>()? {
        Value::String(value) => Ok(value),
        _ => Err(ctx.fail(FormatError::NotAString { scope, member })),
    }
}

/// Read an optional string member; numbers are accepted in their text form
pub(crate) fn next_optional_string<'de, A: MapAccess<'de>>(
    map: &mut A,
    ctx: &mut DecodeContext<'_>,
    scope: Scope,
    member: &'static str,
) -> Result<Option<String>, A::Error> {
    match map.next_value::<Value>()? {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value)),
        Value::Number(number) => Ok(Some(number.to_string())),
        _ => Err(ctx.fail(FormatError::NotAString { scope, member })),
    }
}

/// Route scalar input to the visitor's `unexpected` error instead of serde's
/// generic invalid-type message
macro_rules! reject_scalars {
    () => {
        fn visit_bool<E: serde::de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Err(self.unexpected())
        }

        fn visit_i64<E: serde::de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Err(self.unexpected())
        }

        fn visit_u64<E: serde::de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Err(self.unexpected())
        }

        fn visit_f64<E: serde::de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Err(self.unexpected())
        }

        fn visit_str<E: serde::de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Err(self.unexpected())
        }
    };
}

pub(crate) use reject_scalars;
