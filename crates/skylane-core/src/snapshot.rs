// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::feed::{AircraftFeed, FeedError, LiveAircraft};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// One point-in-time capture of the whole live aircraft set.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub aircraft: Vec<LiveAircraft>,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<Arc<Snapshot>, FeedError>>>;

struct Current {
    snapshot: Arc<Snapshot>,
    taken: Instant,
}

#[derive(Default)]
struct CacheState {
    current: Option<Current>,
    in_flight: Option<RefreshFuture>,
}

struct Inner {
    feed: Arc<dyn AircraftFeed>,
    ttl: Duration,
    timeout: Duration,
    state: Mutex<CacheState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Time-bounded cache over an [`AircraftFeed`].
///
/// The state lock is only held to inspect or swap values, never across an
/// upstream call. Concurrent callers that find the snapshot stale share a
/// single in-flight refresh.
#[derive(Clone)]
pub struct LiveSnapshotCache {
    inner: Arc<Inner>,
}

impl LiveSnapshotCache {
    pub fn new(feed: Arc<dyn AircraftFeed>) -> Self {
        Self::with_limits(feed, DEFAULT_TTL, DEFAULT_UPSTREAM_TIMEOUT)
    }

    pub fn with_limits(feed: Arc<dyn AircraftFeed>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                feed,
                ttl,
                timeout,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Returns the current snapshot, refreshing first if it is missing or
    /// older than the TTL.
    ///
    /// A failed refresh falls back to the previous snapshot. Only when there
    /// has never been a good snapshot does the error reach the caller.
    pub async fn get_snapshot(&self) -> Result<Arc<Snapshot>, FeedError> {
        let refresh = {
            let mut state = self.inner.state();
            if let Some(current) = &state.current {
                if current.taken.elapsed() <= self.inner.ttl {
                    return Ok(Arc::clone(&current.snapshot));
                }
            }
            match &state.in_flight {
                Some(pending) => {
                    debug!("Joining in-flight live feed refresh");
                    pending.clone()
                }
                None => {
                    let pending = Self::refresh(Arc::clone(&self.inner));
                    state.in_flight = Some(pending.clone());
                    pending
                }
            }
        };
        refresh.await
    }

    /// The cached snapshot without triggering a refresh, however old.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.inner
            .state()
            .current
            .as_ref()
            .map(|c| Arc::clone(&c.snapshot))
    }

    fn refresh(inner: Arc<Inner>) -> RefreshFuture {
        async move {
            let started = Instant::now();
            let fetched = match tokio::time::timeout(inner.timeout, inner.feed.fetch_all_aircraft())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(inner.timeout)),
            };

            let mut state = inner.state();
            state.in_flight = None;
            match fetched {
                Ok(aircraft) => {
                    info!(
                        "Live snapshot refreshed — aircraft={} elapsed_ms={}",
                        aircraft.len(),
                        started.elapsed().as_millis()
                    );
                    let snapshot = Arc::new(Snapshot {
                        fetched_at: Utc::now(),
                        aircraft,
                    });
                    state.current = Some(Current {
                        snapshot: Arc::clone(&snapshot),
                        taken: Instant::now(),
                    });
                    Ok(snapshot)
                }
                Err(e) => match &state.current {
                    Some(previous) => {
                        warn!(
                            "Live feed refresh failed; serving previous snapshot — error={} fetched_at={}",
                            e, previous.snapshot.fetched_at
                        );
                        Ok(Arc::clone(&previous.snapshot))
                    }
                    None => {
                        warn!("Live feed refresh failed with no snapshot to fall back on — error={}", e);
                        Err(e)
                    }
                },
            }
        }
        .boxed()
        .shared()
    }
}
