//! Conversation turns
//!
//! A turn is one message of the caller-maintained conversation. The front-ends
//! send either the Gemini shape (`{"role": "user", "parts": [{"text": ...}]}`)
//! or the flatter chat shape (`{"role": "user", "content": "..."}`); both
//! deserialize into the same `Turn`.

use serde::{Deserialize, Deserializer, Serialize};

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Generated by the model. `assistant` is accepted as an alias.
    #[serde(alias = "assistant")]
    Model,
}

impl Role {
    /// Provider wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message of a conversation
///
/// Validation is enforced during deserialization - invalid instances cannot exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    parts: Vec<String>,
}

impl Turn {
    /// Create a user turn with a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    /// Create a model turn with a single text part
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// Get the role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Get the text parts in order
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPart {
            Bare(String),
            Text { text: String },
        }

        #[derive(Deserialize)]
        struct RawTurn {
            role: Role,
            #[serde(default)]
            parts: Option<Vec<RawPart>>,
            #[serde(default)]
            content: Option<String>,
        }

        let raw = RawTurn::deserialize(deserializer)?;

        let parts: Vec<String> = match (raw.parts, raw.content) {
            (Some(_), Some(_)) => {
                return Err(serde::de::Error::custom(
                    "turn must carry either 'parts' or 'content', not both",
                ));
            }
            (None, None) => {
                return Err(serde::de::Error::custom(
                    "turn must carry 'parts' or 'content'",
                ));
            }
            (Some(parts), None) => parts
                .into_iter()
                .map(|part| match part {
                    RawPart::Bare(text) | RawPart::Text { text } => text,
                })
                .collect(),
            (None, Some(content)) => vec![content],
        };

        if parts.is_empty() {
            return Err(serde::de::Error::custom("turn 'parts' cannot be empty"));
        }

        if parts.iter().all(|p| p.trim().is_empty()) {
            return Err(serde::de::Error::custom(
                "turn text cannot be empty or contain only whitespace",
            ));
        }

        Ok(Turn {
            role: raw.role,
            parts,
        })
    }
}
