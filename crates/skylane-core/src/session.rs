// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::feed::LiveAircraft;
use crate::matcher::{MatchError, MatchKind, RouteMatch, RouteMatcher};
use crate::resolve::{Confidence, Resolution, ResolutionService};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Consumer of session output, typically a map or list renderer.
///
/// Always receives the full list and the current selection, never a diff.
/// Implementations may call back into [`TrackingSession::select_flight`].
pub trait FlightView: Send + Sync {
    fn set_flights(&self, flights: &[LiveAircraft]);
    fn set_selected_flight(&self, id: Option<&str>);
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No airport matches '{0}'. Type a city, airport name or 3-letter code.")]
    Unresolved(String),
    #[error("'{input}' matches several airports ({}); pick one", .candidates.join(", "))]
    Ambiguous {
        input: String,
        candidates: Vec<String>,
    },
    #[error("Origin and destination cannot be the same ({0})")]
    SameEndpoints(String),
    #[error("Live route lookup failed: {0}")]
    Match(#[from] MatchError),
}

impl SessionError {
    /// True for input problems the user can fix by retyping.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SessionError::Match(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Idle,
    Searching,
    Populated,
    Empty,
    Failed(SessionError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    /// Optional flight-number filter, matched as a substring ignoring case and spaces.
    pub flight_number: Option<String>,
}

impl SearchRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            flight_number: None,
        }
    }

    pub fn with_flight_number(mut self, flight_number: impl Into<String>) -> Self {
        self.flight_number = Some(flight_number.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Applied(SessionPhase),
    /// A newer search (or a clear) started before this one finished.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub origin_code: Option<String>,
    pub dest_code: Option<String>,
    pub match_kind: Option<MatchKind>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Relevance order.
    pub flights: Vec<LiveAircraft>,
    pub selected_id: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            origin_code: None,
            dest_code: None,
            match_kind: None,
            fetched_at: None,
            flights: Vec::new(),
            selected_id: None,
        }
    }
}

impl SessionState {
    pub fn selected(&self) -> Option<&LiveAircraft> {
        let id = self.selected_id.as_deref()?;
        self.flights.iter().find(|f| f.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.flights.iter().any(|f| f.id == id)
    }
}

/// Full list + selection captured under the lock, pushed to the view after it.
struct Update {
    flights: Vec<LiveAircraft>,
    selected: Option<String>,
}

impl Update {
    fn of(state: &SessionState) -> Self {
        Self {
            flights: state.flights.clone(),
            selected: state.selected_id.clone(),
        }
    }
}

/// Binds resolution and route matching to a list + selection a renderer shows.
pub struct TrackingSession {
    resolver: ResolutionService,
    matcher: RouteMatcher,
    view: Arc<dyn FlightView>,
    state: Mutex<SessionState>,
    search_seq: AtomicU64,
}

impl TrackingSession {
    pub fn new(resolver: ResolutionService, matcher: RouteMatcher, view: Arc<dyn FlightView>) -> Self {
        Self {
            resolver,
            matcher,
            view,
            state: Mutex::new(SessionState::default()),
            search_seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase.clone()
    }

    /// Resolves both endpoints and matches the route.
    ///
    /// Each call takes a new sequence token; a result is only applied if no
    /// newer search or [`clear`](Self::clear) started while it was running.
    pub async fn search(&self, request: SearchRequest) -> SearchOutcome {
        let token = self.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().phase = SessionPhase::Searching;

        let result = self.run(&request).await;

        let mut state = self.lock();
        if self.search_seq.load(Ordering::SeqCst) != token {
            debug!(
                "Discarding superseded search — token={} route={}-{}",
                token, request.origin, request.destination
            );
            return SearchOutcome::Superseded;
        }

        let changed = match result {
            Ok((origin, dest, matched)) => {
                info!(
                    "Route search complete — route={}-{} kind={:?} flights={}",
                    origin,
                    dest,
                    matched.kind,
                    matched.flights.len()
                );
                state.origin_code = Some(origin);
                state.dest_code = Some(dest);
                state.match_kind = Some(matched.kind);
                state.fetched_at = Some(matched.fetched_at);
                state.phase = if matched.flights.is_empty() {
                    SessionPhase::Empty
                } else {
                    SessionPhase::Populated
                };
                Self::replace_flights(&mut state, matched.flights)
            }
            Err(e) => {
                warn!("Route search failed — error={}", e);
                state.origin_code = None;
                state.dest_code = None;
                state.match_kind = None;
                state.fetched_at = None;
                state.phase = SessionPhase::Failed(e);
                Self::replace_flights(&mut state, Vec::new())
            }
        };
        let phase = state.phase.clone();
        let update = changed.then(|| Update::of(&state));
        drop(state);

        self.push(update);
        SearchOutcome::Applied(phase)
    }

    /// Selects `id` if it is one of the current flights, otherwise falls back
    /// to the first flight. Ignored unless the session is populated.
    pub fn select_flight(&self, id: &str) -> bool {
        let mut state = self.lock();
        if state.phase != SessionPhase::Populated {
            debug!("Ignoring flight selection outside a populated session — id={}", id);
            return false;
        }

        let found = state.contains(id);
        let next = if found {
            Some(id.to_string())
        } else {
            debug!("Unknown flight selected; falling back to first — id={}", id);
            state.flights.first().map(|f| f.id.clone())
        };
        let update = (state.selected_id != next).then(|| {
            state.selected_id = next;
            Update::of(&state)
        });
        drop(state);

        self.push(update);
        found
    }

    /// Back to idle: drops results and selection, and orphans any running search.
    pub fn clear(&self) {
        self.search_seq.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let changed = !state.flights.is_empty() || state.selected_id.is_some();
        *state = SessionState::default();
        let update = changed.then(|| Update::of(&state));
        drop(state);

        self.push(update);
    }

    async fn run(
        &self,
        request: &SearchRequest,
    ) -> Result<(String, String, RouteMatch), SessionError> {
        let origin = self.endpoint(&request.origin)?;
        let dest = self.endpoint(&request.destination)?;
        if origin == dest {
            return Err(SessionError::SameEndpoints(origin));
        }

        let mut matched = self.matcher.match_route(&origin, &dest).await?;

        if let Some(needle) = request
            .flight_number
            .as_deref()
            .map(normalize_flight_number)
            .filter(|n| !n.is_empty())
        {
            matched
                .flights
                .retain(|f| normalize_flight_number(&f.flight_number).contains(&needle));
        }

        Ok((origin, dest, matched))
    }

    fn endpoint(&self, input: &str) -> Result<String, SessionError> {
        match self.resolver.resolve(input) {
            Resolution::Unresolved => Err(SessionError::Unresolved(input.trim().to_string())),
            Resolution::Resolved(r) if r.confidence == Confidence::Ambiguous => {
                Err(SessionError::Ambiguous {
                    input: input.trim().to_string(),
                    candidates: r.candidates.into_iter().map(|c| c.code).collect(),
                })
            }
            Resolution::Resolved(r) => Ok(r.code),
        }
    }

    /// Installs a new flight list, keeping the selection if it survived and
    /// otherwise falling back to the first flight. Returns whether the list
    /// or the selection changed.
    fn replace_flights(state: &mut SessionState, flights: Vec<LiveAircraft>) -> bool {
        let mut changed = state.flights != flights;
        state.flights = flights;

        let keep = state
            .selected_id
            .as_deref()
            .is_some_and(|id| state.contains(id));
        let next = if keep {
            state.selected_id.clone()
        } else {
            state.flights.first().map(|f| f.id.clone())
        };
        if state.selected_id != next {
            state.selected_id = next;
            changed = true;
        }
        changed
    }

    fn push(&self, update: Option<Update>) {
        if let Some(update) = update {
            self.view.set_flights(&update.flights);
            self.view.set_selected_flight(update.selected.as_deref());
        }
    }
}

fn normalize_flight_number(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
