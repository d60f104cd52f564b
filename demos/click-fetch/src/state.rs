//! The app snapshot and its pure transition function.

use crate::action::AppAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything the view needs.
///
/// The store publishes a new snapshot for every action; published snapshots
/// are never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    /// Clicks accepted so far
    pub click_count: u64,
    /// Body of the most recent successful fetch
    pub last_fetched_payload: Option<Value>,
}

impl AppSnapshot {
    /// Apply `action` in place.
    ///
    /// Clicks saturate at `u64::MAX`; unrecognized actions change nothing.
    pub fn apply(&mut self, action: &AppAction) {
        match action {
            AppAction::ClickRequested { .. } => {
                self.click_count = self.click_count.saturating_add(1);
            },
            AppAction::PayloadReceived { payload } => {
                self.last_fetched_payload = Some(payload.clone());
            },
            AppAction::Unrecognized { .. } => {},
        }
    }
}

/// Compute the snapshot that follows `snapshot` after `action`.
///
/// Pure and total: the input is left untouched and equal inputs give equal
/// outputs.
#[must_use]
pub fn reduce(snapshot: &AppSnapshot, action: &AppAction) -> AppSnapshot {
    let mut next = snapshot.clone();
    next.apply(action);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tally_testing::properties::{json_payload, search_term};

    #[test]
    fn click_increments_and_keeps_payload() {
        let before = AppSnapshot {
            click_count: 2,
            last_fetched_payload: Some(json!([1])),
        };
        let after = reduce(&before, &AppAction::click("rust"));

        assert_eq!(after.click_count, 3);
        assert_eq!(after.last_fetched_payload, Some(json!([1])));
    }

    #[test]
    fn payload_received_replaces_payload_only() {
        let before = AppSnapshot {
            click_count: 3,
            last_fetched_payload: None,
        };
        let after = reduce(&before, &AppAction::payload_received(json!({"a": 1})));

        assert_eq!(
            after,
            AppSnapshot {
                click_count: 3,
                last_fetched_payload: Some(json!({"a": 1})),
            }
        );
    }

    #[test]
    fn unrecognized_returns_equal_snapshot() {
        let before = AppSnapshot {
            click_count: 9,
            last_fetched_payload: Some(json!("x")),
        };
        let action = AppAction::from_parts("unknown", None);
        assert_eq!(reduce(&before, &action), before);
    }

    #[test]
    fn clicks_saturate() {
        let before = AppSnapshot {
            click_count: u64::MAX,
            last_fetched_payload: None,
        };
        assert_eq!(reduce(&before, &AppAction::click("")).click_count, u64::MAX);
    }

    proptest! {
        #[test]
        fn n_clicks_add_n(start in 0_u64..1_000_000, terms in prop::collection::vec(search_term(), 0..50)) {
            let initial = AppSnapshot { click_count: start, last_fetched_payload: None };
            let end = terms
                .iter()
                .fold(initial, |snapshot, term| reduce(&snapshot, &AppAction::click(term.as_str())));
            prop_assert_eq!(end.click_count, start + terms.len() as u64);
            prop_assert!(end.last_fetched_payload.is_none());
        }

        #[test]
        fn reduce_is_pure(count in any::<u64>(), stored in proptest::option::of(json_payload()), incoming in json_payload()) {
            let snapshot = AppSnapshot { click_count: count, last_fetched_payload: stored };
            let copy = snapshot.clone();
            let action = AppAction::payload_received(incoming);

            let first = reduce(&snapshot, &action);
            let second = reduce(&snapshot, &action);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(snapshot, copy);
        }
    }
}
