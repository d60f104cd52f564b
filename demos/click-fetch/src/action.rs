//! Actions understood by the click-fetch store.
//!
//! On the wire an action is `{"type": <kind>, "payload": <value>}` with an
//! optional payload. Decoding never fails on an unknown kind: it becomes
//! [`AppAction::Unrecognized`], which the reducer ignores.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Something that happened in the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub enum AppAction {
    /// The user asked for data; counts as one click.
    ClickRequested {
        /// What to search for
        search_term: String,
    },
    /// A fetch finished with a JSON body.
    PayloadReceived {
        /// The decoded body
        payload: Value,
    },
    /// A kind this app does not handle.
    Unrecognized {
        /// The tag as it was received
        kind: String,
    },
}

/// Tag identifying the kind of an [`AppAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// [`AppAction::ClickRequested`]
    Click,
    /// [`AppAction::PayloadReceived`]
    PayloadReceived,
    /// [`AppAction::Unrecognized`]
    Unrecognized,
}

impl ActionKind {
    /// Canonical wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PayloadReceived => "payloadReceived",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Look up a kind by wire name; `clickRequested` is accepted for clicks.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "click" | "clickRequested" => Self::Click,
            "payloadReceived" => Self::PayloadReceived,
            _ => Self::Unrecognized,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AppAction {
    /// A click searching for `search_term`.
    #[must_use]
    pub fn click(search_term: impl Into<String>) -> Self {
        Self::ClickRequested {
            search_term: search_term.into(),
        }
    }

    /// A fetch result.
    #[must_use]
    pub const fn payload_received(payload: Value) -> Self {
        Self::PayloadReceived { payload }
    }

    /// Build an action from a kind name and an optional payload.
    ///
    /// Never fails. A click without a payload searches for the empty term and
    /// a click with a non-string payload searches for its JSON text; a
    /// `payloadReceived` without a payload carries `null`.
    #[must_use]
    pub fn from_parts(kind: &str, payload: Option<Value>) -> Self {
        match ActionKind::from_name(kind) {
            ActionKind::Click => Self::click(search_term_of(payload)),
            ActionKind::PayloadReceived => Self::payload_received(payload.unwrap_or(Value::Null)),
            ActionKind::Unrecognized => Self::Unrecognized {
                kind: kind.to_string(),
            },
        }
    }

    /// The kind of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ClickRequested { .. } => ActionKind::Click,
            Self::PayloadReceived { .. } => ActionKind::PayloadReceived,
            Self::Unrecognized { .. } => ActionKind::Unrecognized,
        }
    }
}

fn search_term_of(payload: Option<Value>) -> String {
    match payload {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(term)) => term,
        Some(other) => other.to_string(),
    }
}

/// Wire shape shared by every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl From<RawAction> for AppAction {
    fn from(raw: RawAction) -> Self {
        Self::from_parts(&raw.kind, raw.payload)
    }
}

impl From<AppAction> for RawAction {
    fn from(action: AppAction) -> Self {
        let kind = action.kind().name().to_string();
        match action {
            AppAction::ClickRequested { search_term } => Self {
                kind,
                payload: Some(Value::String(search_term)),
            },
            AppAction::PayloadReceived { payload } => Self {
                kind,
                payload: Some(payload),
            },
            AppAction::Unrecognized { kind } => Self { kind, payload: None },
        }
    }
}
