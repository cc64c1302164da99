//! pop-launcher JSON IPC types.
//!
//! One JSON value per line in both directions. Requests are either a bare
//! string sentinel (`"Exit"`, `"Interrupt"`) or an object keyed by the request
//! name; responses are bare strings or `{"Append": {...}}`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

const EXIT: &str = "\"Exit\"";
const INTERRUPT: &str = "\"Interrupt\"";

/// A decoded request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Search(String),
    Activate(u32),
    Interrupt,
    Exit,
    /// Valid JSON object we do not act on (e.g. `Complete`, `Context`).
    Unhandled(String),
}

/// Structured shape of object requests. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(rename = "Search")]
    search: Option<String>,
    #[serde(rename = "Activate")]
    activate: Option<u32>,
    #[serde(rename = "Complete")]
    #[allow(dead_code)]
    complete: Option<u32>,
    #[serde(rename = "Context")]
    #[allow(dead_code)]
    context: Option<u32>,
}

impl Request {
    /// Decode one input line. Sentinels are matched first on the trimmed
    /// text, everything else goes through the structured decoder.
    pub fn decode(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed == EXIT {
            return Ok(Request::Exit);
        }
        if trimmed == INTERRUPT {
            return Ok(Request::Interrupt);
        }

        // Only objects are requests. The derived decoder would also fill the
        // struct from an array by position.
        let value: serde_json::Value =
            serde_json::from_str(trimmed).context("failed to parse request")?;
        if !value.is_object() {
            bail!("failed to parse request: expected an object");
        }
        let raw: RawRequest =
            serde_json::from_value(value).context("failed to parse request")?;

        Ok(match raw {
            RawRequest {
                search: Some(query),
                ..
            } => Request::Search(query),
            RawRequest {
                activate: Some(id), ..
            } => Request::Activate(id),
            _ => Request::Unhandled(line.to_string()),
        })
    }
}

/// Icon hint attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconSource {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IconSource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Payload of an `Append` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSearchResult {
    pub id: u32,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSource>,
}

/// Everything the plugin writes to the launcher.
///
/// Externally tagged, so unit variants serialize as bare strings and
/// `Append` as `{"Append": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Response {
    Append(PluginSearchResult),
    Clear,
    Close,
    Finished,
}

impl Response {
    /// Encode as a single line, without the trailing newline.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to marshal response")
    }
}
