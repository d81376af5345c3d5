/// Resend presets and the CURL commands generated from them.
///
/// A preset file is a JSON object keyed by client name. Missing fields
/// default to empty strings and the `any` platform:
///
/// ```json
/// {
///   "Loja Centro": { "platform": "plugg", "url": "https://hub.example/hook", "user": "42", "oi": "" }
/// }
/// ```
use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Payload layout expected by the receiving integration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// `{"type": "ORDER", "content": {"id", "oi"}}` (default).
    #[default]
    Any,
    /// `{"orderId", "act": "created"}` with a numeric id.
    Tray,
    /// Order webhook with `user` and an empty change set.
    Plugg,
}

/// Settings of one client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Payload layout.
    #[serde(default)]
    pub platform: Platform,
    /// Endpoint receiving the orders.
    #[serde(default)]
    pub url: String,
    /// Account id, inserted unquoted into `plugg` payloads.
    #[serde(default)]
    pub user: String,
    /// Integration id for `any` payloads.
    #[serde(default)]
    pub oi: String,
}

/// Presets by client name, kept sorted so saved files diff cleanly.
pub type PresetBook = BTreeMap<String, Preset>;

/// Parses a preset file.
///
/// # Errors
///
/// The `serde_json` error when the text is not a preset object.
pub fn parse_presets(json: &str) -> Result<PresetBook, serde_json::Error> {
    serde_json::from_str(json)
}

/// Renders a preset file, pretty-printed with a trailing newline.
///
/// # Errors
///
/// The `serde_json` error; not expected for string-keyed maps.
pub fn presets_to_json(book: &PresetBook) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(book)?;
    json.push('\n');
    Ok(json)
}

impl Preset {
    /// The CURL command re-sending order `id`.
    ///
    /// Every value lands inside a single-quoted shell word, so embedded
    /// single quotes are escaped.
    ///
    /// ```text
    /// curl --location 'https://hub.example/hook' \
    /// --header 'Content-Type: application/json' \
    /// --data '{"orderId":123,"act":"created"}'
    /// ```
    pub fn command(&self, id: &str) -> String {
        let url = quoted(&self.url);
        let id = quoted(id);
        let head = format!(
            "curl --location '{url}' \\\n--header 'Content-Type: application/json' \\\n"
        );
        let data = match self.platform {
            Platform::Any => format!(
                "--data '{{\n  \"type\": \"ORDER\",\n  \"content\": {{ \"id\": \"{id}\", \"oi\": \"{oi}\" }}\n}}'",
                oi = quoted(&self.oi)
            ),
            Platform::Plugg => format!(
                "--data '{{\n  \"id\": \"{id}\",\n  \"action\": \"created\",\n  \"user\": {user},\n  \
                 \"changes\": {{ \"status\": false, \"stock\": false, \"price\": false }},\n  \
                 \"type\": \"orders\"\n}}'",
                user = quoted(&self.user)
            ),
            Platform::Tray => format!("--data '{{\"orderId\":{id},\"act\":\"created\"}}'"),
        };
        head + &data
    }
}

/// Escapes `'` for use inside a single-quoted shell word.
fn quoted(value: &str) -> String {
    value.replace('\'', r"'\''")
}
