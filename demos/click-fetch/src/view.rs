//! Rendering a snapshot for the terminal.

use crate::state::AppSnapshot;
use serde::Serialize;
use std::fmt;

/// Page heading.
pub const HEADING: &str = "Hello, World!";
/// Label of the load button.
pub const BUTTON_LABEL: &str = "Load Reddit data";
/// Caption above the payload.
pub const CAPTION: &str = "Reddit data (click to load):";
/// Shown instead of the payload before anything was loaded.
pub const PLACEHOLDER: &str = "(nothing loaded yet)";

/// What the screen shows for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    /// Page heading
    pub heading: &'static str,
    /// Label of the load button
    pub button_label: &'static str,
    /// Caption above the payload
    pub caption: &'static str,
    /// `Number of clicks: N`
    pub clicks_line: String,
    /// Pretty-printed payload, or the placeholder
    pub payload_text: String,
}

/// Build the display model for `snapshot`.
#[must_use]
pub fn render(snapshot: &AppSnapshot) -> DisplayModel {
    let payload_text = snapshot
        .last_fetched_payload
        .as_ref()
        .and_then(|payload| serde_json::to_string_pretty(payload).ok())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    DisplayModel {
        heading: HEADING,
        button_label: BUTTON_LABEL,
        caption: CAPTION,
        clicks_line: format!("Number of clicks: {}", snapshot.click_count),
        payload_text,
    }
}

impl fmt::Display for DisplayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "[ {} ]", self.button_label)?;
        writeln!(f, "{}", self.caption)?;
        writeln!(f, "{}", self.clicks_line)?;
        write!(f, "{}", self.payload_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_without_payload() {
        let model = render(&AppSnapshot::default());

        assert_eq!(model.heading, "Hello, World!");
        assert_eq!(model.clicks_line, "Number of clicks: 0");
        assert_eq!(model.payload_text, PLACEHOLDER);
    }

    #[test]
    fn payload_is_pretty_printed() {
        let snapshot = AppSnapshot {
            click_count: 2,
            last_fetched_payload: Some(json!({"data": [1], "kind": "Listing"})),
        };

        let model = render(&snapshot);

        assert_eq!(
            model.payload_text,
            "{\n  \"data\": [\n    1\n  ],\n  \"kind\": \"Listing\"\n}"
        );
        assert_eq!(model.clicks_line, "Number of clicks: 2");
    }

    #[test]
    fn display_lists_every_line() {
        let text = render(&AppSnapshot::default()).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            [
                "Hello, World!",
                "[ Load Reddit data ]",
                "Reddit data (click to load):",
                "Number of clicks: 0",
                "(nothing loaded yet)",
            ]
        );
    }
}
