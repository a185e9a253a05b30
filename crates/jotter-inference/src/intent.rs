//! What the user wants done to their text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use jotter_core::Error;

/// Text transformation requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Rewrite,
    Expand,
    Summarize,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Rewrite => "rewrite",
            Intent::Expand => "expand",
            Intent::Summarize => "summarize",
        }
    }

    /// System instruction sent ahead of the user's text.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Intent::Rewrite => {
                "You are a professional writing assistant. Rewrite the user's text to improve \
                 clarity and style while keeping its meaning, language and tone. \
                 Reply with the rewritten text only."
            }
            Intent::Expand => {
                "You are a professional writing assistant. Expand the user's text with relevant \
                 detail and examples while keeping its meaning, language and tone. \
                 Reply with the expanded text only."
            }
            Intent::Summarize => {
                "You are a professional writing assistant. Summarize the user's text concisely, \
                 keeping the key points and writing in the same language. \
                 Reply with the summary only."
            }
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rewrite" | "polish" => Ok(Intent::Rewrite),
            "expand" => Ok(Intent::Expand),
            "summarize" | "summarise" => Ok(Intent::Summarize),
            other => Err(Error::InvalidInput(format!("unknown intent: {other}"))),
        }
    }
}
