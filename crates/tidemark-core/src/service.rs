//! The observation query service: every read operation callers use.
//!
//! One [`ObservationService`] value owns what a query needs -- the
//! endpoint handle, the stream identity, and the cancellation token --
//! so nothing lives in globals. Per-query state (the accumulator and the
//! cursor chain) stays on the call stack, which lets a single service
//! value serve overlapping queries from concurrent tasks.
//!
//! Reads come in two families. The plain historical reads list events as
//! published, without touching tags. The updateable reads request tags
//! and either fold the log into its live observations (reconciliation)
//! or drop tombstones event-by-event for latest-known-good lookups.

use chrono::{DateTime, Utc};
use tidemark_client::{CancellationToken, SparqlEndpoint, build_select, collect_bindings};
use tidemark_types::{DatasetId, Event, EventField, MetricId, Observation, QueryWindow, ThingId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::normalize::events_from_bindings;
use crate::reconcile::reconcile;

/// The observation query service.
///
/// Construct once at startup; the service is cheap to share by reference
/// across tasks. Attach a shared cancellation token with
/// [`with_cancellation`] when callers need to abandon long fetches.
///
/// [`with_cancellation`]: ObservationService::with_cancellation
pub struct ObservationService {
    endpoint: SparqlEndpoint,
    dataset_id: DatasetId,
    event_metric_id: MetricId,
    cancel: CancellationToken,
}

impl ObservationService {
    /// Create a service over one endpoint and stream identity.
    ///
    /// `event_metric_id` names the dataset's distinguished event stream,
    /// the one [`historical_events`] reads.
    ///
    /// [`historical_events`]: ObservationService::historical_events
    pub fn new(
        endpoint: SparqlEndpoint,
        dataset_id: DatasetId,
        event_metric_id: MetricId,
    ) -> Self {
        Self {
            endpoint,
            dataset_id,
            event_metric_id,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the cancellation token with a shared one.
    ///
    /// Cancelling any clone of the token aborts in-progress queries at
    /// their next page boundary with [`ServiceError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // -----------------------------------------------------------------------
    // Plain historical reads (tags never touched)
    // -----------------------------------------------------------------------

    /// List observations of a metric, optionally bounded and boundary-filled.
    ///
    /// With at least one bound set this pages the bounded window. With
    /// `fill_window` and a `begin` bound, a result that does not already
    /// carry `begin` as its first element (the newest under the default
    /// descending order) is prefixed with the single observation from
    /// strictly before `begin`; when nothing earlier exists the result is
    /// simply left as fetched. With neither bound this degrades to the
    /// single latest observation.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] or [`ServiceError::Protocol`]
    /// when a page cannot be fetched or normalized, and
    /// [`ServiceError::Cancelled`] when the token was cancelled.
    pub async fn historical_observations(
        &self,
        thing_id: Option<&ThingId>,
        metric_id: &MetricId,
        begin: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        fill_window: bool,
    ) -> Result<Vec<Observation>, ServiceError> {
        let query_id = Uuid::now_v7();
        info!(
            query_id = %query_id,
            dataset = %self.dataset_id,
            metric = %metric_id,
            fill_window,
            "historical observations query"
        );

        if begin.is_none() && end.is_none() {
            return self.previous_observations(thing_id, metric_id, None, 1).await;
        }

        let window = bounded_window(thing_id, metric_id, begin, end, None);
        let events = self.fetch_events(&window).await?;
        let mut observations: Vec<Observation> = events.iter().map(Observation::from).collect();

        if fill_window
            && let Some(begin) = begin
            && !window_starts_at(&observations, begin)
        {
            let earlier = self
                .previous_observations(thing_id, metric_id, Some(begin), 1)
                .await?;
            observations = prepend_earlier(observations, earlier);
        }

        Ok(observations)
    }

    /// List up to `count` observations from strictly before `before`.
    ///
    /// With `before` absent the latest-value query shape applies, which
    /// returns at most one row regardless of `count`.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`historical_observations`].
    ///
    /// [`historical_observations`]: ObservationService::historical_observations
    pub async fn previous_observations(
        &self,
        thing_id: Option<&ThingId>,
        metric_id: &MetricId,
        before: Option<DateTime<Utc>>,
        count: usize,
    ) -> Result<Vec<Observation>, ServiceError> {
        let query_id = Uuid::now_v7();
        debug!(
            query_id = %query_id,
            dataset = %self.dataset_id,
            metric = %metric_id,
            count,
            "previous observations query"
        );
        let window = bounded_window(thing_id, metric_id, None, before, Some(count));
        let events = self.fetch_events(&window).await?;
        Ok(events.iter().map(Observation::from).collect())
    }

    // -----------------------------------------------------------------------
    // Updateable reads (tags requested, revisions honored)
    // -----------------------------------------------------------------------

    /// Reconcile a window of the log into its current live observations.
    ///
    /// Revisions sharing an identity collapse to the highest version;
    /// winning tombstones leave nothing behind. The result is in stable
    /// identity order, not time order.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`historical_observations`].
    ///
    /// [`historical_observations`]: ObservationService::historical_observations
    pub async fn updateable_observations(
        &self,
        thing_id: Option<&ThingId>,
        metric_id: &MetricId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Observation>, ServiceError> {
        let query_id = Uuid::now_v7();
        info!(
            query_id = %query_id,
            dataset = %self.dataset_id,
            metric = %metric_id,
            "updateable observations query"
        );
        let mut window = bounded_window(thing_id, metric_id, from, to, limit);
        window.fields.push(EventField::Tags);
        let events = self.fetch_events(&window).await?;
        Ok(reconcile(&events))
    }

    /// List up to `count` pre-`before` observations with tombstones dropped.
    ///
    /// Unlike [`updateable_observations`] this does not fold revisions;
    /// each event is kept or dropped on its own `deleted` tag. Callers use
    /// it for latest-known-good lookups where a raw tombstone must never
    /// surface. A tombstone occupying a fetched slot shrinks the result
    /// rather than triggering a deeper scan.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`historical_observations`].
    ///
    /// [`updateable_observations`]: ObservationService::updateable_observations
    /// [`historical_observations`]: ObservationService::historical_observations
    pub async fn previous_updateable_observations(
        &self,
        thing_id: Option<&ThingId>,
        metric_id: &MetricId,
        before: Option<DateTime<Utc>>,
        count: usize,
    ) -> Result<Vec<Observation>, ServiceError> {
        let query_id = Uuid::now_v7();
        debug!(
            query_id = %query_id,
            dataset = %self.dataset_id,
            metric = %metric_id,
            count,
            "previous updateable observations query"
        );
        let mut window = bounded_window(thing_id, metric_id, None, before, Some(count));
        window.fields.push(EventField::Tags);
        let events = self.fetch_events(&window).await?;
        Ok(events
            .iter()
            .filter(|event| !event.tags.deleted)
            .map(Observation::from)
            .collect())
    }

    /// Read the dataset's distinguished event stream.
    ///
    /// With a bound present this reconciles the bounded window; with no
    /// bounds it answers the latest known good event.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`historical_observations`].
    ///
    /// [`historical_observations`]: ObservationService::historical_observations
    pub async fn historical_events(
        &self,
        begin: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, ServiceError> {
        let query_id = Uuid::now_v7();
        info!(
            query_id = %query_id,
            dataset = %self.dataset_id,
            metric = %self.event_metric_id,
            "historical events query"
        );
        if begin.is_some() || end.is_some() {
            self.updateable_observations(None, &self.event_metric_id, begin, end, None)
                .await
        } else {
            self.previous_updateable_observations(None, &self.event_metric_id, None, 1)
                .await
        }
    }

    // -----------------------------------------------------------------------
    // Operations the stream does not serve
    // -----------------------------------------------------------------------

    /// Action history is not part of the event stream.
    ///
    /// # Errors
    ///
    /// Always returns [`ServiceError::Unsupported`].
    pub fn historical_actions(&self) -> Result<Vec<Observation>, ServiceError> {
        Err(ServiceError::Unsupported(format!(
            "action history is not served for dataset {}",
            self.dataset_id
        )))
    }

    /// The stream is consumed read-only; nothing can be posted to it.
    ///
    /// # Errors
    ///
    /// Always returns [`ServiceError::Unsupported`].
    pub fn post_actions(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported(format!(
            "dataset {} is consumed read-only; actions cannot be posted",
            self.dataset_id
        )))
    }

    /// Single-event lookup by id is not answerable over the query shape.
    ///
    /// # Errors
    ///
    /// Always returns [`ServiceError::Unsupported`].
    pub fn historical_event_by_id(&self, event_id: &str) -> Result<Observation, ServiceError> {
        Err(ServiceError::Unsupported(format!(
            "event lookup by id is not served for dataset {}: {event_id}",
            self.dataset_id
        )))
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    /// Build, page, and normalize one window.
    async fn fetch_events(&self, window: &QueryWindow) -> Result<Vec<Event>, ServiceError> {
        let query = build_select(window);
        let bindings = collect_bindings(&self.endpoint, &query, window.limit, &self.cancel).await?;
        events_from_bindings(&bindings, window.wants_tags())
    }
}

/// A window over `metric_id` between the given bounds with the plain
/// timestamp/value projection.
fn bounded_window(
    thing_id: Option<&ThingId>,
    metric_id: &MetricId,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: Option<usize>,
) -> QueryWindow {
    let mut window = QueryWindow::new(metric_id.clone());
    window.thing_id = thing_id.cloned();
    window.from = from;
    window.to = to;
    window.limit = limit;
    window
}

/// Whether the result's first element carries exactly the `begin` bound.
///
/// The check reads the first element in arrival order, which under the
/// default descending order is the newest row of the window.
fn window_starts_at(observations: &[Observation], begin: DateTime<Utc>) -> bool {
    observations
        .first()
        .is_some_and(|first| first.timestamp == begin)
}

/// Prefix boundary-fill rows fetched from before the window.
fn prepend_earlier(observations: Vec<Observation>, earlier: Vec<Observation>) -> Vec<Observation> {
    let mut filled = earlier;
    filled.extend(observations);
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    fn obs(millis: i64, value: f64) -> Observation {
        Observation {
            timestamp: at(millis),
            value,
        }
    }

    fn service() -> Option<ObservationService> {
        let endpoint = SparqlEndpoint::new("http://127.0.0.1:9", Duration::from_millis(200)).ok()?;
        Some(ObservationService::new(
            endpoint,
            DatasetId::new("water-quality"),
            MetricId::new("event.stream"),
        ))
    }

    #[test]
    fn bounded_window_carries_bounds_and_cap() {
        let metric = MetricId::new("temperature");
        let thing = ThingId::new("sensor-7");
        let window = bounded_window(Some(&thing), &metric, Some(at(100)), Some(at(200)), Some(25));
        assert_eq!(window.thing_id.as_ref().map(ThingId::as_str), Some("sensor-7"));
        assert_eq!(window.from, Some(at(100)));
        assert_eq!(window.to, Some(at(200)));
        assert_eq!(window.limit, Some(25));
        assert!(!window.wants_tags());
    }

    #[test]
    fn empty_result_never_starts_at_begin() {
        assert!(!window_starts_at(&[], at(100)));
    }

    #[test]
    fn window_starts_at_reads_the_first_element() {
        let covered = vec![obs(100, 1.0), obs(50, 0.5)];
        assert!(window_starts_at(&covered, at(100)));

        // The check looks only at the head of the list, so a window whose
        // first element differs from the bound counts as uncovered even
        // when a later element matches it.
        let uncovered = vec![obs(150, 1.5), obs(100, 1.0)];
        assert!(!window_starts_at(&uncovered, at(100)));
    }

    #[test]
    fn prepend_earlier_keeps_both_orders() {
        let filled = prepend_earlier(vec![obs(200, 2.0), obs(150, 1.5)], vec![obs(90, 0.9)]);
        let timestamps: Vec<DateTime<Utc>> = filled.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![at(90), at(200), at(150)]);
    }

    #[test]
    fn prepend_with_no_earlier_rows_is_identity() {
        // "Nothing before the window" is a legitimate empty fill.
        let filled = prepend_earlier(vec![obs(200, 2.0)], Vec::new());
        assert_eq!(filled.len(), 1);
    }

    #[test]
    fn unsupported_operations_return_the_distinct_kind() {
        let Some(service) = service() else {
            return;
        };
        assert!(matches!(
            service.historical_actions(),
            Err(ServiceError::Unsupported(_))
        ));
        assert!(matches!(
            service.post_actions(),
            Err(ServiceError::Unsupported(_))
        ));
        assert!(matches!(
            service.historical_event_by_id("urn:event:42"),
            Err(ServiceError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_service_reports_cancellation() {
        let Some(service) = service() else {
            return;
        };
        let token = CancellationToken::new();
        let service = service.with_cancellation(token.clone());
        token.cancel();

        let metric = MetricId::new("temperature");
        let result = service
            .previous_observations(None, &metric, None, 1)
            .await;
        assert!(matches!(result, Err(ServiceError::Cancelled)));
    }
}
