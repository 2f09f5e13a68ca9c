//! Client-side visit tracking.
//!
//! A [`VisitTracker`] decides whether a visit starts a new session and only
//! then bumps the counter. A visit starts a new session when no visit has
//! been recorded within the session window (30 minutes by default). The
//! window slides: every visit, counted or not, refreshes `last_visit`.
//! Each counted visit also adds the visitor id to a capped set of unique
//! visitors.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  analytics::UniqueVisitors,
  counter::VisitorCounter,
  record::{VisitorRecord, iso_millis},
  store::DocumentStore,
};

/// Idle period, in minutes, after which a returning visitor is counted again.
pub const SESSION_WINDOW_MINUTES: i64 = 30;

/// Persisted per-client tracking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
  pub visitor_id: Uuid,
  #[serde(default, with = "iso_millis::option")]
  pub last_visit: Option<DateTime<Utc>>,
  #[serde(default)]
  pub last_count: Option<u64>,
  #[serde(default)]
  pub unique_visitors: UniqueVisitors,
}

impl TrackerState {
  /// A fresh state with a newly generated visitor id.
  pub fn fresh() -> Self {
    Self {
      visitor_id: Uuid::new_v4(),
      last_visit: None,
      last_count: None,
      unique_visitors: UniqueVisitors::default(),
    }
  }

  /// Whether a visit at `now` starts a new session.
  pub fn is_new_session(&self, now: DateTime<Utc>, window: Duration) -> bool {
    match self.last_visit {
      None => true,
      Some(last) => now - last > window,
    }
  }
}

/// Outcome of [`VisitTracker::record_visit`].
#[derive(Debug, Clone)]
pub struct Visit {
  pub record:          VisitorRecord,
  pub new_session:     bool,
  pub visitor_id:      Uuid,
  pub unique_visitors: usize,
}

pub struct VisitTracker<S> {
  store:  S,
  window: Duration,
}

impl<S> VisitTracker<S>
where
  S: DocumentStore<TrackerState>,
{
  pub fn new(store: S) -> Self {
    Self {
      store,
      window: Duration::minutes(SESSION_WINDOW_MINUTES),
    }
  }

  pub fn with_window(mut self, window: Duration) -> Self {
    self.window = window;
    self
  }

  /// Load the tracking state; anything unreadable starts over.
  pub async fn state(&self) -> TrackerState {
    match self.store.load().await {
      Ok(Some(state)) => state,
      Ok(None) => TrackerState::fresh(),
      Err(e) => {
        tracing::warn!(error = %e, "tracker state unreadable, starting fresh");
        TrackerState::fresh()
      }
    }
  }

  /// Record a visit at `now`, incrementing `counter` if it starts a new
  /// session.
  pub async fn record_visit<C>(&self, counter: &C, now: DateTime<Utc>) -> Result<Visit>
  where
    C: VisitorCounter,
  {
    let mut state = self.state().await;
    let new_session = state.is_new_session(now, self.window);

    let record = if new_session {
      counter.increment().await
    } else {
      counter.current().await
    }
    .map_err(Error::counter)?;

    if new_session {
      state.unique_visitors.insert(state.visitor_id);
    }
    state.last_visit = Some(now);
    state.last_count = Some(record.count);
    self.store.save(&state).await.map_err(Error::store)?;

    tracing::debug!(
      visitor_id = %state.visitor_id,
      new_session,
      count = record.count,
      "visit recorded"
    );

    Ok(Visit {
      record,
      new_session,
      visitor_id: state.visitor_id,
      unique_visitors: state.unique_visitors.len(),
    })
  }

  /// Forget every unique visitor seen so far. The current visitor id and
  /// session are kept.
  pub async fn forget_visitors(&self) -> Result<()> {
    let mut state = self.state().await;
    state.unique_visitors = UniqueVisitors::default();
    self.store.save(&state).await.map_err(Error::store)
  }

  /// Reset `counter` and forget the current session, so the next visit is
  /// counted. The visitor id is kept.
  pub async fn reset<C>(&self, counter: &C, count: Option<u64>) -> Result<VisitorRecord>
  where
    C: VisitorCounter,
  {
    let record = counter.reset(count).await.map_err(Error::counter)?;

    let mut state = self.state().await;
    state.last_visit = None;
    state.last_count = Some(record.count);
    self.store.save(&state).await.map_err(Error::store)?;

    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{counter::Counter, record::DEFAULT_COUNT, store::MemoryStore};

  fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minute.into())
  }

  fn setup() -> (
    VisitTracker<MemoryStore<TrackerState>>,
    Counter<MemoryStore<VisitorRecord>>,
  ) {
    (
      VisitTracker::new(MemoryStore::new()),
      Counter::new(MemoryStore::new()),
    )
  }

  #[tokio::test]
  async fn first_visit_is_counted() {
    let (tracker, counter) = setup();
    let visit = tracker.record_visit(&counter, at(0)).await.unwrap();
    assert!(visit.new_session);
    assert_eq!(visit.record.count, DEFAULT_COUNT + 1);
  }

  #[tokio::test]
  async fn visits_within_window_are_not_counted() {
    let (tracker, counter) = setup();
    let first = tracker.record_visit(&counter, at(0)).await.unwrap();
    let second = tracker.record_visit(&counter, at(10)).await.unwrap();

    assert!(!second.new_session);
    assert_eq!(second.record.count, first.record.count);
    assert_eq!(second.visitor_id, first.visitor_id);
  }

  #[tokio::test]
  async fn window_slides_with_each_visit() {
    let (tracker, counter) = setup();
    tracker.record_visit(&counter, at(0)).await.unwrap();
    tracker.record_visit(&counter, at(25)).await.unwrap();
    // 45 minutes after the first visit but only 20 after the last one.
    let visit = tracker.record_visit(&counter, at(45)).await.unwrap();
    assert!(!visit.new_session);
  }

  #[tokio::test]
  async fn visit_after_idle_window_is_counted() {
    let (tracker, counter) = setup();
    tracker.record_visit(&counter, at(0)).await.unwrap();
    let visit = tracker.record_visit(&counter, at(31)).await.unwrap();
    assert!(visit.new_session);
    assert_eq!(visit.record.count, DEFAULT_COUNT + 2);
  }

  #[tokio::test]
  async fn custom_window() {
    let (tracker, counter) = setup();
    let tracker = tracker.with_window(Duration::minutes(5));
    tracker.record_visit(&counter, at(0)).await.unwrap();
    assert!(tracker.record_visit(&counter, at(6)).await.unwrap().new_session);
  }

  #[tokio::test]
  async fn state_records_last_visit_and_count() {
    let (tracker, counter) = setup();
    let visit = tracker.record_visit(&counter, at(3)).await.unwrap();
    let state = tracker.state().await;
    assert_eq!(state.last_visit, Some(at(3)));
    assert_eq!(state.last_count, Some(visit.record.count));
  }

  #[tokio::test]
  async fn reset_forgets_session_but_keeps_visitor() {
    let (tracker, counter) = setup();
    let first = tracker.record_visit(&counter, at(0)).await.unwrap();

    let record = tracker.reset(&counter, Some(50)).await.unwrap();
    assert_eq!(record.count, 50);

    let visit = tracker.record_visit(&counter, at(1)).await.unwrap();
    assert!(visit.new_session);
    assert_eq!(visit.record.count, 51);
    assert_eq!(visit.visitor_id, first.visitor_id);
  }

  #[test]
  fn state_round_trips_through_json() {
    let mut state = TrackerState {
      visitor_id: Uuid::new_v4(),
      last_visit: Some(at(0)),
      last_count: Some(1200),
      unique_visitors: UniqueVisitors::default(),
    };
    state.unique_visitors.insert(state.visitor_id);
    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("\"lastVisit\":\"2025-06-01T09:00:00.000Z\""));
    assert!(json.contains(&format!("\"uniqueVisitors\":[\"{}\"]", state.visitor_id)));
    let back: TrackerState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
  }

  #[test]
  fn older_state_without_unique_visitors_still_loads() {
    let json = r#"{"visitorId":"6f1d3c1e-4a5b-4c2d-9e8f-0a1b2c3d4e5f","lastVisit":null}"#;
    let state: TrackerState = serde_json::from_str(json).unwrap();
    assert!(state.unique_visitors.is_empty());
  }

  #[tokio::test]
  async fn counted_visits_record_the_visitor_once() {
    let (tracker, counter) = setup();
    let first = tracker.record_visit(&counter, at(0)).await.unwrap();
    assert_eq!(first.unique_visitors, 1);

    // Within the window: not counted, set unchanged.
    tracker.record_visit(&counter, at(5)).await.unwrap();
    // New session for the same visitor: still one unique visitor.
    let later = tracker.record_visit(&counter, at(60)).await.unwrap();
    assert!(later.new_session);
    assert_eq!(later.unique_visitors, 1);

    let state = tracker.state().await;
    assert!(state.unique_visitors.contains(&first.visitor_id));
  }

  #[tokio::test]
  async fn forgetting_visitors_keeps_the_session() {
    let (tracker, counter) = setup();
    let first = tracker.record_visit(&counter, at(0)).await.unwrap();
    tracker.forget_visitors().await.unwrap();

    let state = tracker.state().await;
    assert!(state.unique_visitors.is_empty());
    assert_eq!(state.visitor_id, first.visitor_id);
    assert_eq!(state.last_visit, Some(at(0)));
  }
}
