//! Local visit analytics.
//!
//! An [`AnalyticsLog`] keeps the current session, the last
//! [`SESSION_LOG_CAP`] finished sessions, the last [`INTERACTION_LOG_CAP`]
//! interactions and per-category tallies, all in one document. [`Analytics`]
//! loads it from a [`DocumentStore`], applies one change and writes it back.
//! Aggregates are plain tallies computed on read.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, record::iso_millis, store::DocumentStore};

pub const SESSION_LOG_CAP: usize = 100;
pub const INTERACTION_LOG_CAP: usize = 500;
pub const UNIQUE_VISITOR_CAP: usize = 1000;

/// Counter category for page views.
pub const POPULAR_PAGES: &str = "popularPages";

/// Append `item`, dropping the oldest entries beyond `cap`.
fn push_capped<T>(log: &mut Vec<T>, item: T, cap: usize) {
  log.push(item);
  if log.len() > cap {
    log.drain(..log.len() - cap);
  }
}

// ─── Unique visitors ──────────────────────────────────────────────────────────

/// Visitor ids seen so far, oldest first, capped at [`UNIQUE_VISITOR_CAP`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueVisitors(Vec<Uuid>);

impl UniqueVisitors {
  /// Record `id`. Returns `false` if it was already known.
  pub fn insert(&mut self, id: Uuid) -> bool {
    if self.0.contains(&id) {
      return false;
    }
    push_capped(&mut self.0, id, UNIQUE_VISITOR_CAP);
    true
  }

  pub fn contains(&self, id: &Uuid) -> bool { self.0.contains(id) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

// ─── Sessions & interactions ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceType {
  Desktop,
  Mobile,
  Tablet,
}

impl DeviceType {
  pub fn from_user_agent(user_agent: &str) -> Self {
    let ua = user_agent.to_lowercase();
    if ua.contains("mobile") {
      DeviceType::Mobile
    } else if ua.contains("tablet") || ua.contains("ipad") {
      DeviceType::Tablet
    } else {
      DeviceType::Desktop
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      DeviceType::Desktop => "desktop",
      DeviceType::Mobile => "mobile",
      DeviceType::Tablet => "tablet",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub id:           String,
  #[serde(with = "iso_millis")]
  pub start_time:   DateTime<Utc>,
  #[serde(default, with = "iso_millis::option")]
  pub end_time:     Option<DateTime<Utc>>,
  pub page_views:   u32,
  pub interactions: u32,
  pub referrer:     String,
  pub user_agent:   String,
}

impl Session {
  fn new(now: DateTime<Utc>, referrer: Option<&str>, user_agent: &str) -> Self {
    let suffix = Uuid::new_v4().simple().to_string();
    Self {
      id: format!("session_{}_{}", now.timestamp_millis(), &suffix[..9]),
      start_time: now,
      end_time: None,
      page_views: 0,
      interactions: 0,
      referrer: referrer
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("direct")
        .to_string(),
      user_agent: user_agent.to_string(),
    }
  }

  /// Length of a finished session in milliseconds; never negative.
  pub fn duration_ms(&self) -> Option<u64> {
    self
      .end_time
      .map(|end| (end - self.start_time).num_milliseconds().max(0) as u64)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
  pub action:    String,
  #[serde(with = "iso_millis")]
  pub timestamp: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detail:    Option<String>,
}

// ─── Log ─────────────────────────────────────────────────────────────────────

/// Everything the analytics keep, as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsLog {
  pub current:         Option<Session>,
  pub sessions:        Vec<Session>,
  pub interactions:    Vec<Interaction>,
  pub counters:        BTreeMap<String, BTreeMap<String, u64>>,
  /// Length of the last finished session.
  pub time_spent_secs: u64,
}

impl AnalyticsLog {
  /// The current session, started at `now` if there is none.
  pub fn start_session(
    &mut self,
    now: DateTime<Utc>,
    referrer: Option<&str>,
    user_agent: &str,
  ) -> &Session {
    self
      .current
      .get_or_insert_with(|| Session::new(now, referrer, user_agent))
  }

  /// Count a view of `page` in the current session. No-op without one.
  pub fn page_view(&mut self, page: &str) -> bool {
    let Some(session) = self.current.as_mut() else {
      return false;
    };
    session.page_views += 1;
    self.bump(POPULAR_PAGES, page);
    true
  }

  /// Log an interaction in the current session. No-op without one.
  pub fn interaction(&mut self, action: &str, detail: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(session) = self.current.as_mut() else {
      return false;
    };
    session.interactions += 1;
    push_capped(
      &mut self.interactions,
      Interaction {
        action:    action.to_string(),
        timestamp: now,
        detail:    detail.map(str::to_string),
      },
      INTERACTION_LOG_CAP,
    );
    true
  }

  /// Add one to `counters[category][key]`.
  pub fn bump(&mut self, category: &str, key: &str) {
    *self
      .counters
      .entry(category.to_string())
      .or_default()
      .entry(key.to_string())
      .or_default() += 1;
  }

  /// Close the current session at `now` and move it into the session log.
  pub fn end_session(&mut self, now: DateTime<Utc>) -> Option<Session> {
    let mut session = self.current.take()?;
    session.end_time = Some(now);
    self.time_spent_secs = session.duration_ms().unwrap_or(0) / 1000;
    push_capped(&mut self.sessions, session.clone(), SESSION_LOG_CAP);
    Some(session)
  }

  /// Aggregate the logged sessions. Visitor totals come from the counter
  /// and the tracker, which keep their own state.
  pub fn summary(
    &self,
    now: DateTime<Utc>,
    total_visitors: u64,
    unique_visitors: usize,
  ) -> AnalyticsSummary {
    let today = now.date_naive();
    let sessions_today = self
      .sessions
      .iter()
      .filter(|s| s.start_time.date_naive() == today)
      .count();

    let durations: Vec<u64> = self.sessions.iter().filter_map(Session::duration_ms).collect();
    let average_session_secs = match durations.len() as u64 {
      0 => 0,
      n => (durations.iter().sum::<u64>() + n * 500) / (n * 1000),
    };

    let mut top_referrers: BTreeMap<String, u64> = BTreeMap::new();
    let mut device_types: BTreeMap<&'static str, u64> = BTreeMap::new();
    for session in &self.sessions {
      *top_referrers.entry(session.referrer.clone()).or_default() += 1;
      *device_types
        .entry(DeviceType::from_user_agent(&session.user_agent).as_str())
        .or_default() += 1;
    }

    AnalyticsSummary {
      total_visitors,
      unique_visitors,
      sessions_today,
      average_session_secs,
      top_referrers,
      device_types,
      popular_pages: self.counters.get(POPULAR_PAGES).cloned().unwrap_or_default(),
      time_spent_secs: self.time_spent_secs,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
  pub total_visitors:       u64,
  pub unique_visitors:      usize,
  pub sessions_today:       usize,
  pub average_session_secs: u64,
  pub top_referrers:        BTreeMap<String, u64>,
  pub device_types:         BTreeMap<&'static str, u64>,
  pub popular_pages:        BTreeMap<String, u64>,
  pub time_spent_secs:      u64,
}

/// The summary together with the raw log, for export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsExport {
  pub analytics:    AnalyticsSummary,
  pub sessions:     Vec<Session>,
  pub interactions: Vec<Interaction>,
  pub counters:     BTreeMap<String, BTreeMap<String, u64>>,
}

// ─── Store-backed handle ─────────────────────────────────────────────────────

pub struct Analytics<S> {
  store: S,
}

impl<S> Analytics<S>
where
  S: DocumentStore<AnalyticsLog>,
{
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// The stored log; anything unreadable starts over.
  pub async fn log(&self) -> AnalyticsLog {
    match self.store.load().await {
      Ok(log) => log.unwrap_or_default(),
      Err(e) => {
        tracing::warn!(error = %e, "analytics log unreadable, starting fresh");
        AnalyticsLog::default()
      }
    }
  }

  async fn update<R, F>(&self, change: F) -> Result<R>
  where
    F: FnOnce(&mut AnalyticsLog) -> R,
  {
    let mut log = self.log().await;
    let out = change(&mut log);
    self.store.save(&log).await.map_err(Error::store)?;
    Ok(out)
  }

  pub async fn start_session(
    &self,
    now: DateTime<Utc>,
    referrer: Option<&str>,
    user_agent: &str,
  ) -> Result<Session> {
    self
      .update(|log| log.start_session(now, referrer, user_agent).clone())
      .await
  }

  pub async fn track_page_view(&self, page: &str) -> Result<bool> {
    self.update(|log| log.page_view(page)).await
  }

  pub async fn track_interaction(
    &self,
    action: &str,
    detail: Option<&str>,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    self.update(|log| log.interaction(action, detail, now)).await
  }

  pub async fn end_session(&self, now: DateTime<Utc>) -> Result<Option<Session>> {
    let session = self.update(|log| log.end_session(now)).await?;
    if let Some(session) = &session {
      tracing::debug!(id = %session.id, page_views = session.page_views, "session ended");
    }
    Ok(session)
  }

  pub async fn summary(
    &self,
    now: DateTime<Utc>,
    total_visitors: u64,
    unique_visitors: usize,
  ) -> AnalyticsSummary {
    self.log().await.summary(now, total_visitors, unique_visitors)
  }

  pub async fn export(
    &self,
    now: DateTime<Utc>,
    total_visitors: u64,
    unique_visitors: usize,
  ) -> AnalyticsExport {
    let log = self.log().await;
    AnalyticsExport {
      analytics:    log.summary(now, total_visitors, unique_visitors),
      sessions:     log.sessions,
      interactions: log.interactions,
      counters:     log.counters,
    }
  }

  /// Drop everything, including the current session.
  pub async fn clear(&self) -> Result<()> {
    self
      .store
      .save(&AnalyticsLog::default())
      .await
      .map_err(Error::store)?;
    tracing::info!("analytics cleared");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::store::MemoryStore;

  fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
  }

  const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64)";
  const PHONE: &str = "Mozilla/5.0 (iPhone) Mobile/15E148";

  #[test]
  fn unique_visitors_ignore_repeats_and_drop_oldest() {
    let mut seen = UniqueVisitors::default();
    let first = Uuid::new_v4();
    assert!(seen.insert(first));
    assert!(!seen.insert(first));

    for _ in 0..UNIQUE_VISITOR_CAP {
      seen.insert(Uuid::new_v4());
    }
    assert_eq!(seen.len(), UNIQUE_VISITOR_CAP);
    assert!(!seen.contains(&first));
  }

  #[test]
  fn session_log_keeps_the_last_hundred() {
    let mut log = AnalyticsLog::default();
    for i in 0..(SESSION_LOG_CAP as i64 + 20) {
      log.start_session(at(i), None, DESKTOP);
      log.end_session(at(i) + Duration::seconds(30));
    }
    assert_eq!(log.sessions.len(), SESSION_LOG_CAP);
    assert_eq!(log.sessions[0].start_time, at(20));
  }

  #[test]
  fn interaction_log_keeps_the_last_five_hundred() {
    let mut log = AnalyticsLog::default();
    log.start_session(at(0), None, DESKTOP);
    for i in 0..(INTERACTION_LOG_CAP + 5) {
      log.interaction("click", Some(i.to_string().as_str()), at(0));
    }
    assert_eq!(log.interactions.len(), INTERACTION_LOG_CAP);
    assert_eq!(log.interactions[0].detail.as_deref(), Some("5"));
    assert_eq!(
      log.current.as_ref().unwrap().interactions as usize,
      INTERACTION_LOG_CAP + 5
    );
  }

  #[test]
  fn tracking_needs_a_session() {
    let mut log = AnalyticsLog::default();
    assert!(!log.page_view("/"));
    assert!(!log.interaction("click", None, at(0)));
    assert!(log.end_session(at(1)).is_none());
    assert!(log.counters.is_empty());
  }

  #[test]
  fn starting_twice_keeps_the_open_session() {
    let mut log = AnalyticsLog::default();
    let id = log.start_session(at(0), Some("https://a.example"), DESKTOP).id.clone();
    let again = log.start_session(at(5), None, PHONE);
    assert_eq!(again.id, id);
    assert_eq!(again.referrer, "https://a.example");
    assert!(id.starts_with("session_"));
  }

  #[test]
  fn summary_tallies_sessions() {
    let mut log = AnalyticsLog::default();

    log.start_session(at(0), None, DESKTOP);
    log.page_view("/");
    log.page_view("/projects");
    log.end_session(at(2));

    log.start_session(at(10), Some("https://news.example"), PHONE);
    log.page_view("/");
    log.end_session(at(11));

    // An unfinished session from the previous day.
    log.sessions.push(Session::new(at(-24 * 60), Some("  "), "iPad tablet"));

    let summary = log.summary(at(30), 1500, 3);
    assert_eq!(summary.total_visitors, 1500);
    assert_eq!(summary.unique_visitors, 3);
    assert_eq!(summary.sessions_today, 2);
    // (120 s + 60 s) / 2 completed sessions.
    assert_eq!(summary.average_session_secs, 90);
    assert_eq!(summary.time_spent_secs, 60);
    assert_eq!(summary.top_referrers["direct"], 2);
    assert_eq!(summary.top_referrers["https://news.example"], 1);
    assert_eq!(summary.device_types["desktop"], 1);
    assert_eq!(summary.device_types["mobile"], 1);
    assert_eq!(summary.device_types["tablet"], 1);
    assert_eq!(summary.popular_pages["/"], 2);
    assert_eq!(summary.popular_pages["/projects"], 1);
  }

  #[test]
  fn empty_summary_is_zero() {
    let summary = AnalyticsLog::default().summary(at(0), 1110, 0);
    assert_eq!(summary.average_session_secs, 0);
    assert_eq!(summary.sessions_today, 0);
    assert!(summary.popular_pages.is_empty());
  }

  #[test]
  fn log_serialises_camel_case() {
    let mut log = AnalyticsLog::default();
    log.start_session(at(0), None, DESKTOP);
    log.page_view("/");
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json["current"]["pageViews"], 1);
    assert_eq!(json["current"]["startTime"], "2025-06-01T09:00:00.000Z");
    assert_eq!(json["counters"]["popularPages"]["/"], 1);
    assert_eq!(json["timeSpentSecs"], 0);

    let back: AnalyticsLog = serde_json::from_value(json).unwrap();
    assert_eq!(back, log);
  }

  #[tokio::test]
  async fn store_backed_round_trip() {
    let analytics = Analytics::new(MemoryStore::new());
    let session = analytics.start_session(at(0), None, DESKTOP).await.unwrap();
    assert!(analytics.track_page_view("/about").await.unwrap());
    assert!(
      analytics
        .track_interaction("link_click", Some("github"), at(1))
        .await
        .unwrap()
    );

    let ended = analytics.end_session(at(5)).await.unwrap().unwrap();
    assert_eq!(ended.id, session.id);
    assert_eq!(ended.page_views, 1);
    assert_eq!(ended.interactions, 1);

    let export = analytics.export(at(6), 1111, 1).await;
    assert_eq!(export.sessions.len(), 1);
    assert_eq!(export.interactions[0].action, "link_click");
    assert_eq!(export.analytics.average_session_secs, 300);
    assert_eq!(export.counters[POPULAR_PAGES]["/about"], 1);

    analytics.clear().await.unwrap();
    assert_eq!(analytics.log().await, AnalyticsLog::default());
  }
}
