// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// TrackingSession state machine: validation, result application, selection,
// stale-result discard and renderer notifications.

mod common;

use async_trait::async_trait;
use common::{aircraft, east_coast, tagged};
use skylane_core::feed::StaticFeed;
use skylane_core::{
    AircraftFeed, FeedError, FlightView, LiveAircraft, LiveSnapshotCache, MatchError, MatchKind,
    ResolutionService, RouteMatcher, SearchOutcome, SearchRequest, SessionError, SessionPhase,
    SharedDirectory, TrackingSession,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum ViewEvent {
    Flights(Vec<String>),
    Selected(Option<String>),
}

#[derive(Default)]
struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    fn take(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl FlightView for RecordingView {
    fn set_flights(&self, flights: &[LiveAircraft]) {
        let ids = flights.iter().map(|f| f.id.clone()).collect();
        self.events.lock().unwrap().push(ViewEvent::Flights(ids));
    }

    fn set_selected_flight(&self, id: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Selected(id.map(str::to_string)));
    }
}

fn flights(ids: &[&str]) -> ViewEvent {
    ViewEvent::Flights(ids.iter().map(|s| s.to_string()).collect())
}

fn selected(id: Option<&str>) -> ViewEvent {
    ViewEvent::Selected(id.map(str::to_string))
}

struct Harness {
    session: TrackingSession,
    view: Arc<RecordingView>,
}

fn harness(feed: Arc<dyn AircraftFeed>) -> Harness {
    let directory = SharedDirectory::new(east_coast());
    let cache = LiveSnapshotCache::new(feed);
    let view = Arc::new(RecordingView::default());
    let session = TrackingSession::new(
        ResolutionService::new(directory.clone()),
        RouteMatcher::new(cache, directory),
        view.clone(),
    );
    Harness { session, view }
}

fn static_harness(fleet: Vec<LiveAircraft>) -> (Harness, Arc<StaticFeed>) {
    let feed = Arc::new(StaticFeed::new(fleet));
    (harness(feed.clone()), feed)
}

#[tokio::test]
async fn test_search_populates_and_auto_selects_first() {
    let (h, _) = static_harness(vec![
        tagged("a1", "BOS", "JFK", 41.0, -72.0),
        tagged("a2", "BOS", "JFK", 42.0, -71.5),
    ]);
    assert_eq!(h.session.phase(), SessionPhase::Idle);

    let outcome = h.session.search(SearchRequest::new("boston", "JFK")).await;
    assert_eq!(outcome, SearchOutcome::Applied(SessionPhase::Populated));

    let state = h.session.state();
    assert_eq!(state.origin_code.as_deref(), Some("BOS"));
    assert_eq!(state.dest_code.as_deref(), Some("JFK"));
    assert_eq!(state.match_kind, Some(MatchKind::Strict));
    assert!(state.fetched_at.is_some());
    assert_eq!(state.selected_id.as_deref(), Some("a1"));
    assert_eq!(state.selected().map(|f| f.id.as_str()), Some("a1"));

    assert_eq!(h.view.take(), vec![flights(&["a1", "a2"]), selected(Some("a1"))]);
}

#[tokio::test]
async fn test_no_flights_is_empty_phase() {
    let (h, _) = static_harness(vec![aircraft("far", -33.9, 151.2)]);
    let outcome = h.session.search(SearchRequest::new("BOS", "JFK")).await;
    assert_eq!(outcome, SearchOutcome::Applied(SessionPhase::Empty));
    assert_eq!(h.session.state().match_kind, Some(MatchKind::Corridor));
    // Nothing changed, so the view hears nothing.
    assert!(h.view.take().is_empty());
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_matcher() {
    let (h, feed) = static_harness(vec![]);
    // A broken feed would turn any matcher call into a Match error.
    feed.set(Err(FeedError::Unavailable("should not be called".into())));

    let cases = [
        (
            SearchRequest::new("atlantis", "JFK"),
            SessionError::Unresolved("atlantis".into()),
        ),
        (
            SearchRequest::new("JFK", " jfk "),
            SessionError::SameEndpoints("JFK".into()),
        ),
    ];
    for (request, expected) in cases {
        let outcome = h.session.search(request).await;
        assert_eq!(outcome, SearchOutcome::Applied(SessionPhase::Failed(expected.clone())));
        assert!(expected.is_validation());
    }
}

#[tokio::test]
async fn test_ambiguous_input_surfaces_candidates() {
    let feed = Arc::new(StaticFeed::new(vec![]));
    let directory = SharedDirectory::new(skylane_core::AirportDirectory::from_records(vec![
        common::airport("JFK", "New York", "Kennedy", 40.64, -73.78),
        common::airport("LGA", "New York", "La Guardia", 40.78, -73.87),
        common::airport("BOS", "Boston", "Boston Logan", 42.36, -71.01),
    ]));
    let session = TrackingSession::new(
        ResolutionService::new(directory.clone()),
        RouteMatcher::new(LiveSnapshotCache::new(feed), directory),
        Arc::new(RecordingView::default()),
    );

    match session.search(SearchRequest::new("BOS", "new york")).await {
        SearchOutcome::Applied(SessionPhase::Failed(SessionError::Ambiguous { input, candidates })) => {
            assert_eq!(input, "new york");
            assert_eq!(candidates, vec!["JFK".to_string(), "LGA".to_string()]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[tokio::test]
async fn test_feed_failure_clears_results_and_session_recovers() {
    let (h, feed) = static_harness(vec![tagged("a1", "BOS", "JFK", 41.0, -72.0)]);
    h.session.search(SearchRequest::new("BOS", "JFK")).await;
    h.view.take();

    // Fresh cache with no snapshot and a dead upstream.
    let dead = Arc::new(StaticFeed::new(vec![]));
    dead.set(Err(FeedError::Unavailable("503".into())));
    let broken = harness(dead.clone());
    let outcome = broken.session.search(SearchRequest::new("BOS", "JFK")).await;
    assert_eq!(
        outcome,
        SearchOutcome::Applied(SessionPhase::Failed(SessionError::Match(MatchError::Feed(
            FeedError::Unavailable("503".into())
        ))))
    );
    assert!(broken.session.state().flights.is_empty());

    dead.set(Ok(vec![tagged("b1", "BOS", "JFK", 41.0, -72.0)]));
    let outcome = broken.session.search(SearchRequest::new("BOS", "JFK")).await;
    assert_eq!(outcome, SearchOutcome::Applied(SessionPhase::Populated));

    // The first session still has its data; the upstream change is hidden by the TTL.
    feed.set(Ok(vec![]));
    assert_eq!(h.session.state().flights.len(), 1);
}

#[tokio::test]
async fn test_select_flight() {
    let (h, _) = static_harness(vec![
        tagged("a1", "BOS", "JFK", 41.0, -72.0),
        tagged("a2", "BOS", "JFK", 42.0, -71.5),
    ]);

    // Not populated yet.
    assert!(!h.session.select_flight("a1"));

    h.session.search(SearchRequest::new("BOS", "JFK")).await;
    h.view.take();

    assert!(h.session.select_flight("a2"));
    assert_eq!(h.session.state().selected_id.as_deref(), Some("a2"));
    assert_eq!(h.view.take(), vec![flights(&["a1", "a2"]), selected(Some("a2"))]);

    // Re-selecting is a no-op for the view.
    assert!(h.session.select_flight("a2"));
    assert!(h.view.take().is_empty());

    // Unknown ids fall back to the first flight.
    assert!(!h.session.select_flight("zzz"));
    assert_eq!(h.session.state().selected_id.as_deref(), Some("a1"));
    assert_eq!(h.view.take(), vec![flights(&["a1", "a2"]), selected(Some("a1"))]);

    // Already on the first flight, so nothing to push.
    assert!(!h.session.select_flight("zzz"));
    assert_eq!(h.session.state().selected_id.as_deref(), Some("a1"));
    assert!(h.view.take().is_empty());
}

#[tokio::test]
async fn test_flight_number_filter() {
    let mut a1 = tagged("a1", "BOS", "JFK", 41.0, -72.0);
    a1.flight_number = "B6 1018".into();
    let mut a2 = tagged("a2", "BOS", "JFK", 42.0, -71.5);
    a2.flight_number = "DL 2110".into();
    let (h, _) = static_harness(vec![a1, a2]);

    let request = SearchRequest::new("BOS", "JFK").with_flight_number("b61018");
    assert_eq!(
        h.session.search(request).await,
        SearchOutcome::Applied(SessionPhase::Populated)
    );
    let ids: Vec<_> = h.session.state().flights.into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["a1"]);

    let request = SearchRequest::new("BOS", "JFK").with_flight_number("UA");
    assert_eq!(
        h.session.search(request).await,
        SearchOutcome::Applied(SessionPhase::Empty)
    );
}

#[tokio::test]
async fn test_research_keeps_surviving_selection() {
    let (h, _) = static_harness(vec![
        tagged("a1", "BOS", "JFK", 41.0, -72.0),
        tagged("a2", "BOS", "JFK", 42.0, -71.5),
    ]);
    h.session.search(SearchRequest::new("BOS", "JFK")).await;
    h.session.select_flight("a2");
    h.view.take();

    h.session.search(SearchRequest::new("BOS", "JFK")).await;
    assert_eq!(h.session.state().selected_id.as_deref(), Some("a2"));
    assert!(h.view.take().is_empty());
}

#[tokio::test]
async fn test_clear_resets_to_idle() {
    let (h, _) = static_harness(vec![tagged("a1", "BOS", "JFK", 41.0, -72.0)]);
    h.session.search(SearchRequest::new("BOS", "JFK")).await;
    h.view.take();

    h.session.clear();
    let state = h.session.state();
    assert_eq!(state.phase, SessionPhase::Idle);
    assert!(state.flights.is_empty());
    assert_eq!(state.selected_id, None);
    assert_eq!(h.view.take(), vec![flights(&[]), selected(None)]);

    // Clearing an idle session is silent.
    h.session.clear();
    assert!(h.view.take().is_empty());
}

/// Upstream that takes a while, so searches overlap.
struct SlowFeed {
    fleet: Vec<LiveAircraft>,
}

#[async_trait]
impl AircraftFeed for SlowFeed {
    async fn fetch_all_aircraft(&self) -> Result<Vec<LiveAircraft>, FeedError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(self.fleet.clone())
    }
}

#[tokio::test(start_paused = true)]
async fn test_stale_search_result_is_discarded() {
    let h = harness(Arc::new(SlowFeed {
        fleet: vec![
            tagged("bos-jfk", "BOS", "JFK", 41.0, -72.0),
            tagged("jfk-bos", "JFK", "BOS", 41.0, -72.0),
        ],
    }));

    let (first, second) = tokio::join!(h.session.search(SearchRequest::new("BOS", "JFK")), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.session.search(SearchRequest::new("JFK", "BOS")).await
    });

    assert_eq!(first, SearchOutcome::Superseded);
    assert_eq!(second, SearchOutcome::Applied(SessionPhase::Populated));
    let state = h.session.state();
    assert_eq!(state.origin_code.as_deref(), Some("JFK"));
    assert_eq!(state.selected_id.as_deref(), Some("jfk-bos"));
    assert_eq!(h.view.take(), vec![flights(&["jfk-bos"]), selected(Some("jfk-bos"))]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_orphans_running_search() {
    let h = harness(Arc::new(SlowFeed {
        fleet: vec![tagged("a1", "BOS", "JFK", 41.0, -72.0)],
    }));

    let (outcome, ()) = tokio::join!(h.session.search(SearchRequest::new("BOS", "JFK")), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.session.clear();
    });

    assert_eq!(outcome, SearchOutcome::Superseded);
    assert_eq!(h.session.phase(), SessionPhase::Idle);
    assert!(h.view.take().is_empty());
}
