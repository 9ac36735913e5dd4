//! SPARQL query text construction.
//!
//! The endpoint answers a fixed SELECT shape over the two saref predicates;
//! the only variation between reads is the time filter, the ordering
//! keyword, and whether the latest-value shape's `LIMIT 1` applies. The
//! builder never fails: it performs no validation of bound ordering, and a
//! contradictory window simply produces a query the endpoint answers
//! emptily.

use chrono::{DateTime, Utc};
use tidemark_types::{QueryWindow, TimestampPrecision};

/// Predicate binding an aggregation to its observation timestamp.
pub const TIMESTAMP_PREDICATE: &str = "https://saref.etsi.org/core/hasTimestamp";

/// Predicate binding an aggregation to its observed value.
pub const VALUE_PREDICATE: &str = "https://saref.etsi.org/core/hasValue";

/// Render a timestamp as a typed SPARQL literal.
///
/// Always UTC with a `Z` suffix; sub-second digits follow the requested
/// precision. The decoration marks the literal as `xsd:dateTime` so the
/// endpoint compares it against stored timestamps rather than strings.
fn timestamp_literal(timestamp: DateTime<Utc>, precision: TimestampPrecision) -> String {
    format!(
        "\"{}\"^^<http://www.w3.org/2001/XMLSchema#dateTime>",
        timestamp.to_rfc3339_opts(precision.seconds_format(), true)
    )
}

/// Build the SELECT text for a window.
///
/// Four shapes, chosen by which bounds are present:
///
/// - neither bound: the single latest event (`LIMIT 1`);
/// - only `to`: everything strictly before it;
/// - only `from`: everything strictly after it;
/// - both: the exclusive open interval between them.
///
/// The window's item cap is paging state, never query text, so only the
/// no-bounds shape carries a `LIMIT`. Percent-encoding is left to the
/// transport layer.
pub fn build_select(window: &QueryWindow) -> String {
    let order = window.order.sparql_keyword();
    let filter = match (window.from, window.to) {
        (None, None) => None,
        (None, Some(to)) => Some(format!(
            "FILTER (?timestamp < {})",
            timestamp_literal(to, window.precision)
        )),
        (Some(from), None) => Some(format!(
            "FILTER (?timestamp > {})",
            timestamp_literal(from, window.precision)
        )),
        (Some(from), Some(to)) => Some(format!(
            "FILTER (?timestamp > {} && ?timestamp < {})",
            timestamp_literal(from, window.precision),
            timestamp_literal(to, window.precision)
        )),
    };

    let Some(filter) = filter else {
        return format!(
            "SELECT ?aggregation ?timestamp ?value WHERE {{ \
             ?aggregation <{TIMESTAMP_PREDICATE}> ?timestamp . \
             ?aggregation <{VALUE_PREDICATE}> ?value \
             }} ORDER BY {order}(?timestamp) LIMIT 1"
        );
    };
    format!(
        "SELECT ?aggregation ?timestamp ?value WHERE {{ \
         ?aggregation <{TIMESTAMP_PREDICATE}> ?timestamp . \
         ?aggregation <{VALUE_PREDICATE}> ?value . \
         {filter} \
         }} ORDER BY {order}(?timestamp)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_types::{EventOrdering, MetricId};

    fn millis(value: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(value)
    }

    #[test]
    fn no_bounds_selects_single_latest() {
        let window = QueryWindow::new(MetricId::new("temperature"));
        let query = build_select(&window);
        assert!(query.contains("ORDER BY DESC(?timestamp)"));
        assert!(query.ends_with("LIMIT 1"));
        assert!(query.contains(TIMESTAMP_PREDICATE));
        assert!(query.contains(VALUE_PREDICATE));
        assert!(!query.contains("FILTER"));
    }

    #[test]
    fn only_upper_bound_filters_strictly_before() {
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.to = millis(1_678_107_241_915);
        let query = build_select(&window);
        assert!(query.contains(
            "FILTER (?timestamp < \"2023-03-06T12:54:01.915Z\"\
             ^^<http://www.w3.org/2001/XMLSchema#dateTime>)"
        ));
        assert!(!query.contains("LIMIT"));
    }

    #[test]
    fn only_lower_bound_filters_strictly_after() {
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.from = millis(1_678_107_241_915);
        let query = build_select(&window);
        assert!(query.contains("FILTER (?timestamp > \"2023-03-06T12:54:01.915Z\""));
        assert!(!query.contains("LIMIT"));
    }

    #[test]
    fn both_bounds_form_open_interval() {
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.from = millis(100);
        window.to = millis(200);
        let query = build_select(&window);
        assert!(query.contains(
            "FILTER (?timestamp > \"1970-01-01T00:00:00.100Z\"\
             ^^<http://www.w3.org/2001/XMLSchema#dateTime> \
             && ?timestamp < \"1970-01-01T00:00:00.200Z\"\
             ^^<http://www.w3.org/2001/XMLSchema#dateTime>)"
        ));
        assert!(query.contains("ORDER BY DESC(?timestamp)"));
        assert!(!query.contains("LIMIT"));
    }

    #[test]
    fn bounds_are_exclusive() {
        // A caller passing the newest event's exact timestamp as the upper
        // bound excludes that event; both comparisons are strict.
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.from = millis(100);
        window.to = millis(200);
        let query = build_select(&window);
        assert!(!query.contains(">="));
        assert!(!query.contains("<="));
    }

    #[test]
    fn ascending_order_renders_asc_keyword() {
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.order = EventOrdering::Ascending;
        let query = build_select(&window);
        assert!(query.contains("ORDER BY ASC(?timestamp)"));
    }

    #[test]
    fn seconds_precision_drops_subsecond_digits() {
        let mut window = QueryWindow::new(MetricId::new("temperature"));
        window.to = millis(1_678_107_241_915);
        window.precision = TimestampPrecision::Seconds;
        let query = build_select(&window);
        assert!(query.contains("\"2023-03-06T12:54:01Z\""));
    }
}
