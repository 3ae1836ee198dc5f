//! Codec configuration
//!
//! `CodecOptions` is pass-through host configuration: the codec reads it but
//! never owns policy beyond what is listed here. It derives `Deserialize` so a
//! host can embed it in its own configuration file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Naming policy applied to attribute and relationship member names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// Use the Rust member name unchanged
    #[default]
    None,
    /// `first_name` -> `firstName`
    CamelCase,
    /// `firstName` -> `first_name`
    SnakeCase,
    /// `first_name` -> `first-name`
    KebabCase,
    /// `first_name` -> `FirstName`
    PascalCase,
}

impl NamingPolicy {
    /// Convert a member name according to this policy
    pub fn apply(&self, name: &str) -> String {
        if *self == NamingPolicy::None {
            return name.to_string();
        }
        let words = split_words(name);
        match self {
            NamingPolicy::None => name.to_string(),
            NamingPolicy::SnakeCase => words.join("_"),
            NamingPolicy::KebabCase => words.join("-"),
            NamingPolicy::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(word);
                    } else {
                        push_capitalized(&mut out, word);
                    }
                }
                out
            }
            NamingPolicy::PascalCase => {
                let mut out = String::with_capacity(name.len());
                for word in &words {
                    push_capitalized(&mut out, word);
                }
                out
            }
        }
    }
}

// Splits on `_`, `-` and lower-to-upper case boundaries; words come back lowercase.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

/// When a member value is left out of the written document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreCondition {
    /// Always write the member
    #[default]
    Never,
    /// Skip the member when its value is null
    WhenNull,
    /// Skip the member when its value is null, `false` or zero
    WhenDefault,
    /// Never write the member
    Always,
}

impl IgnoreCondition {
    /// Whether a serialized value should be left out under this condition
    pub fn skips(&self, value: &Value) -> bool {
        match self {
            IgnoreCondition::Never => false,
            IgnoreCondition::Always => true,
            IgnoreCondition::WhenNull => value.is_null(),
            IgnoreCondition::WhenDefault => is_default_value(value),
        }
    }
}

fn is_default_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// How attribute numbers are read and written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberHandling {
    #[default]
    Strict,
    /// Accept numbers encoded as JSON strings when reading
    AllowReadingFromString,
    /// Write numeric attribute values as JSON strings
    WriteAsString,
}

/// Configuration consumed by every codec operation.
///
/// There is no field-inclusion switch: every registered member is a field
/// accessor, so members are included by registering them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Naming policy for attribute and relationship names
    pub naming_policy: NamingPolicy,
    /// Match attribute and relationship names case-insensitively when reading
    pub case_insensitive_members: bool,
    /// Default ignore condition for members without their own override
    pub ignore_condition: IgnoreCondition,
    /// Skip members without a setter when writing
    pub ignore_read_only_members: bool,
    /// Skip members without a getter when reading
    pub ignore_write_only_members: bool,
    /// Number handling for attribute values
    pub number_handling: NumberHandling,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming_policy(mut self, policy: NamingPolicy) -> Self {
        self.naming_policy = policy;
        self
    }

    pub fn with_case_insensitive_members(mut self, enabled: bool) -> Self {
        self.case_insensitive_members = enabled;
        self
    }

    pub fn with_ignore_condition(mut self, condition: IgnoreCondition) -> Self {
        self.ignore_condition = condition;
        self
    }

    pub fn with_ignore_read_only_members(mut self, enabled: bool) -> Self {
        self.ignore_read_only_members = enabled;
        self
    }

    pub fn with_ignore_write_only_members(mut self, enabled: bool) -> Self {
        self.ignore_write_only_members = enabled;
        self
    }

    pub fn with_number_handling(mut self, handling: NumberHandling) -> Self {
        self.number_handling = handling;
        self
    }
}
