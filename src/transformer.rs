//! Value transformers applied before matching.
//!
//! A condition may carry an ordered transformer chain; each candidate
//! string passes through the chain before being handed to the operator.
//! A transformer that does not apply leaves the candidate unchanged.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, WafError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    Lowercase,
    Trim,
    RemoveNulls,
    CompressWhitespace,
    Base64Decode,
}

impl Transformer {
    /// Look up a transformer by its ruleset name.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "lowercase" => Ok(Self::Lowercase),
            "trim" => Ok(Self::Trim),
            "remove_nulls" => Ok(Self::RemoveNulls),
            "compress_whitespace" => Ok(Self::CompressWhitespace),
            "base64_decode" => Ok(Self::Base64Decode),
            _ => Err(WafError::UnknownTransformer(name.to_string())),
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Self::Lowercase => input.to_lowercase(),
            Self::Trim => input.trim().to_string(),
            Self::RemoveNulls => input.replace('\0', ""),
            Self::CompressWhitespace => {
                let mut out = String::with_capacity(input.len());
                let mut in_space = false;
                for c in input.chars() {
                    if c.is_whitespace() {
                        if !in_space {
                            out.push(' ');
                        }
                        in_space = true;
                    } else {
                        out.push(c);
                        in_space = false;
                    }
                }
                out
            }
            Self::Base64Decode => match STANDARD.decode(input) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                // Not base64: pass the candidate through untouched.
                Err(_) => input.to_string(),
            },
        }
    }
}

/// Apply a transformer chain in order.
pub fn apply_all(transformers: &[Transformer], input: String) -> String {
    transformers
        .iter()
        .fold(input, |acc, t| t.apply(&acc))
}
