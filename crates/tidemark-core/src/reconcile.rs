//! Last-write-wins reconciliation of the event log.
//!
//! Updates to a published observation arrive as fresh events sharing an
//! identity and carrying a higher revision; removals arrive as tombstones.
//! Folding a window of events therefore yields the current live set: per
//! identity, the highest revision seen wins, and a winning tombstone
//! leaves nothing behind. Arrival order does not matter for the final
//! state as long as revisions are compared, which makes replay idempotent.

use std::collections::BTreeMap;

use tidemark_types::{EntityId, Event, Observation};

/// Fold state for reconciling one window of events.
///
/// Keyed on ordered maps so the surviving set comes out in a stable
/// identity order regardless of arrival order.
#[derive(Debug, Default)]
pub struct ReconciliationState {
    recorded_versions: BTreeMap<EntityId, u64>,
    live: BTreeMap<EntityId, Observation>,
}

impl ReconciliationState {
    /// Empty state: nothing recorded, nothing live.
    pub const fn new() -> Self {
        Self {
            recorded_versions: BTreeMap::new(),
            live: BTreeMap::new(),
        }
    }

    /// Fold one event into the state.
    ///
    /// Events without an identity are skipped entirely. An event whose
    /// revision is not strictly greater than the recorded one is a no-op,
    /// so the first writer of a revision wins. A winning tombstone removes
    /// the live observation but still records its revision, which blocks
    /// lower-revision revivals arriving later.
    pub fn apply(&mut self, event: &Event) {
        let Some(identity) = event.tags.identity.as_ref() else {
            return;
        };
        if let Some(recorded) = self.recorded_versions.get(identity)
            && event.tags.version <= *recorded
        {
            return;
        }
        self.recorded_versions
            .insert(identity.clone(), event.tags.version);
        if event.tags.deleted {
            self.live.remove(identity);
        } else {
            self.live.insert(identity.clone(), Observation::from(event));
        }
    }

    /// Number of currently live observations.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Consume the state and return the surviving observations in
    /// identity order.
    pub fn into_observations(self) -> Vec<Observation> {
        self.live.into_values().collect()
    }
}

/// Reconcile a window of events into its live observations.
pub fn reconcile(events: &[Event]) -> Vec<Observation> {
    let mut state = ReconciliationState::new();
    for event in events {
        state.apply(event);
    }
    state.into_observations()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tidemark_types::EventTags;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    fn revision(id: &str, version: u64, value: f64) -> Event {
        Event {
            timestamp: at(1_000),
            value,
            tags: EventTags {
                identity: Some(EntityId::new(id)),
                version,
                deleted: false,
            },
        }
    }

    fn tombstone(id: &str, version: u64) -> Event {
        Event {
            timestamp: at(1_000),
            value: 0.0,
            tags: EventTags {
                identity: Some(EntityId::new(id)),
                version,
                deleted: true,
            },
        }
    }

    fn values(observations: &[Observation]) -> Vec<f64> {
        observations.iter().map(|o| o.value).collect()
    }

    #[test]
    fn higher_revision_wins() {
        let events = vec![revision("a", 0, 1.0), revision("a", 1, 2.0)];
        let live = reconcile(&events);
        assert_eq!(values(&live), vec![2.0]);
    }

    #[test]
    fn winning_tombstone_removes_the_observation() {
        let events = vec![revision("a", 0, 1.0), tombstone("a", 1)];
        let live = reconcile(&events);
        assert!(live.is_empty());
    }

    #[test]
    fn out_of_order_arrival_converges() {
        // The revision-2 value arrives first; the stale revision 1 after
        // it must not claw the value back.
        let events = vec![revision("a", 2, 5.0), revision("a", 1, 9.0)];
        let live = reconcile(&events);
        assert_eq!(values(&live), vec![5.0]);
    }

    #[test]
    fn equal_revision_is_first_writer_wins() {
        let events = vec![revision("a", 1, 1.0), revision("a", 1, 99.0)];
        let live = reconcile(&events);
        assert_eq!(values(&live), vec![1.0]);
    }

    #[test]
    fn tombstone_blocks_lower_revision_revival() {
        let events = vec![tombstone("a", 5), revision("a", 3, 7.0)];
        let live = reconcile(&events);
        assert!(live.is_empty());
    }

    #[test]
    fn events_without_identity_are_skipped() {
        let events = vec![
            Event::untagged(at(1_000), 4.0),
            Event::untagged(at(2_000), 5.0),
        ];
        let mut state = ReconciliationState::new();
        for event in &events {
            state.apply(event);
        }
        assert_eq!(state.live_count(), 0);
        assert!(state.into_observations().is_empty());
    }

    #[test]
    fn replay_is_idempotent() {
        let events = vec![
            revision("a", 0, 1.0),
            revision("b", 0, 2.0),
            revision("a", 1, 3.0),
            tombstone("b", 1),
        ];
        let once = reconcile(&events);
        let twice = {
            let mut replayed = events.clone();
            replayed.extend(events);
            reconcile(&replayed)
        };
        assert_eq!(once, twice);
        assert_eq!(values(&once), vec![3.0]);
    }

    #[test]
    fn independent_identities_do_not_interact() {
        let events = vec![
            revision("b", 0, 2.0),
            revision("a", 0, 1.0),
            tombstone("a", 1),
        ];
        let live = reconcile(&events);
        assert_eq!(values(&live), vec![2.0]);
    }

    #[test]
    fn output_is_in_identity_order() {
        let events = vec![revision("b", 0, 2.0), revision("a", 0, 1.0)];
        let live = reconcile(&events);
        assert_eq!(values(&live), vec![1.0, 2.0]);
    }
}
