//! Client-side state: the local mirror of the visitor record, the session
//! tracker and the analytics log, each kept as a JSON file under the state
//! directory.

use std::path::Path;

use folio_core::{
  analytics::{Analytics, AnalyticsLog},
  counter::Counter,
  fallback::Fallback,
  record::VisitorRecord,
  tracker::{TrackerState, VisitTracker},
};
use folio_store_json::JsonFileStore;

use crate::client::ApiClient;

pub const MIRROR_FILE: &str = "visitors.json";
pub const TRACKER_FILE: &str = "tracker.json";
pub const ANALYTICS_FILE: &str = "analytics.json";

/// Remote counter with a local mirror.
pub type RemoteCounter = Fallback<ApiClient, JsonFileStore<VisitorRecord>>;

pub struct LocalState {
  pub counter:   RemoteCounter,
  pub tracker:   VisitTracker<JsonFileStore<TrackerState>>,
  pub analytics: Analytics<JsonFileStore<AnalyticsLog>>,
}

impl LocalState {
  /// Open (or create) the state files under `dir`.
  pub async fn open(dir: &Path, client: ApiClient) -> folio_store_json::Result<Self> {
    let mirror = JsonFileStore::open(dir.join(MIRROR_FILE)).await?;
    let tracker = JsonFileStore::open(dir.join(TRACKER_FILE)).await?;
    let analytics = JsonFileStore::open(dir.join(ANALYTICS_FILE)).await?;
    Ok(Self {
      counter:   Fallback::new(client, Counter::new(mirror)),
      tracker:   VisitTracker::new(tracker),
      analytics: Analytics::new(analytics),
    })
  }
}
