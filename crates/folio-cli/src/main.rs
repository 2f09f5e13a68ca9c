//! `folio`: command-line client for the Folio portfolio backend.
//!
//! # Usage
//!
//! ```text
//! folio visit --page /projects
//! folio --url http://localhost:3001 count
//! folio reset --count 1500
//! folio ask what are his skills
//! folio stats --export
//! ```
//!
//! Counter commands fall back to a local mirror under the state directory
//! when the server cannot be reached. Analytics are only kept locally.

mod client;
mod local;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client::ApiClient;
use folio_core::{
  chat::new_session_id,
  counter::VisitorCounter,
  matcher,
  record::{VisitorRecord, format_count},
};
use local::LocalState;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Client for the Folio portfolio backend")]
struct Args {
  /// Path to a TOML config file (url, state_dir).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the folio server (default: http://localhost:3001).
  #[arg(long, env = "FOLIO_URL")]
  url: Option<String>,

  /// Directory for the local mirror and session state (default: .folio).
  #[arg(long, env = "FOLIO_STATE_DIR")]
  state_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the current visitor count.
  Count,
  /// Record a visit; only counted once per session.
  Visit {
    /// Page being viewed.
    #[arg(long, default_value = "/")]
    page:     String,
    /// Where the visitor came from (default: direct).
    #[arg(long)]
    referrer: Option<String>,
  },
  /// Increment the visitor count unconditionally.
  Increment,
  /// Reset the visitor count and forget the current session.
  Reset {
    /// New count (default: 1110).
    #[arg(long)]
    count: Option<u64>,
  },
  /// Ask the profile assistant a question.
  Ask {
    /// Session id to continue.
    #[arg(long)]
    session: Option<String>,
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
  },
  /// Log an interaction in the current analytics session.
  Track {
    action: String,
    #[arg(long)]
    detail: Option<String>,
  },
  /// End the current analytics session.
  Leave,
  /// Show local analytics.
  Stats {
    /// Print the summary and the raw log as JSON.
    #[arg(long, conflicts_with = "clear")]
    export: bool,
    /// Delete all analytics, including the unique visitor list.
    #[arg(long)]
    clear:  bool,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:       String,
  #[serde(default)]
  state_dir: Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:3001".to_string());
  let state_dir = args
    .state_dir
    .or(file_cfg.state_dir)
    .unwrap_or_else(|| PathBuf::from(".folio"));

  let client = ApiClient::new(base_url).context("creating HTTP client")?;
  run(args.command, client, &state_dir).await
}

async fn run(command: Command, client: ApiClient, state_dir: &Path) -> Result<()> {
  match command {
    Command::Ask { session, question } => ask(&client, session, &question.join(" ")).await?,
    Command::Count => {
      let state = open_state(state_dir, client).await?;
      let record = state.counter.current().await.context("reading count")?;
      print_record("Visitors", &record);
    }
    Command::Visit { page, referrer } => {
      let state = open_state(state_dir, client).await?;
      let now = Utc::now();
      let visit = state
        .tracker
        .record_visit(&state.counter, now)
        .await
        .context("recording visit")?;
      state
        .analytics
        .start_session(now, referrer.as_deref(), &user_agent())
        .await
        .context("starting analytics session")?;
      state
        .analytics
        .track_page_view(&page)
        .await
        .context("recording page view")?;
      let label = if visit.new_session {
        "New visit"
      } else {
        "Returning visit"
      };
      print_record(label, &visit.record);
    }
    Command::Increment => {
      let state = open_state(state_dir, client).await?;
      let record = state.counter.increment().await.context("incrementing count")?;
      print_record("Visitors", &record);
    }
    Command::Reset { count } => {
      let state = open_state(state_dir, client).await?;
      let record = state
        .tracker
        .reset(&state.counter, count)
        .await
        .context("resetting count")?;
      print_record("Reset to", &record);
    }
    Command::Track { action, detail } => {
      let state = open_state(state_dir, client).await?;
      let logged = state
        .analytics
        .track_interaction(&action, detail.as_deref(), Utc::now())
        .await
        .context("recording interaction")?;
      anyhow::ensure!(logged, "no active session; run `folio visit` first");
    }
    Command::Leave => {
      let state = open_state(state_dir, client).await?;
      match state
        .analytics
        .end_session(Utc::now())
        .await
        .context("ending session")?
      {
        Some(session) => println!(
          "Session {} ended after {}s ({} page views)",
          session.id,
          session.duration_ms().unwrap_or(0) / 1000,
          session.page_views
        ),
        None => println!("No active session"),
      }
    }
    Command::Stats { export, clear } => {
      let state = open_state(state_dir, client).await?;
      if clear {
        state.analytics.clear().await.context("clearing analytics")?;
        state
          .tracker
          .forget_visitors()
          .await
          .context("clearing unique visitors")?;
        println!("Analytics cleared");
        return Ok(());
      }
      stats(&state, export).await?;
    }
  }
  Ok(())
}

async fn open_state(state_dir: &Path, client: ApiClient) -> Result<LocalState> {
  LocalState::open(state_dir, client)
    .await
    .with_context(|| format!("opening local state in {}", state_dir.display()))
}

async fn stats(state: &LocalState, export: bool) -> Result<()> {
  let now = Utc::now();
  let total = state.counter.current().await.context("reading count")?.count;
  let unique = state.tracker.state().await.unique_visitors.len();

  if export {
    let data = state.analytics.export(now, total, unique).await;
    println!("{}", serde_json::to_string_pretty(&data)?);
    return Ok(());
  }

  let summary = state.analytics.summary(now, total, unique).await;
  println!("Total visitors:   {}", format_count(summary.total_visitors));
  println!("Unique visitors:  {}", format_count(summary.unique_visitors as u64));
  println!("Sessions today:   {}", summary.sessions_today);
  println!("Average session:  {}s", summary.average_session_secs);
  println!("Last session:     {}s", summary.time_spent_secs);
  print_tally("Top referrers", summary.top_referrers.iter().map(|(k, v)| (k.as_str(), *v)));
  print_tally("Devices", summary.device_types.iter().map(|(k, v)| (*k, *v)));
  print_tally("Pages", summary.popular_pages.iter().map(|(k, v)| (k.as_str(), *v)));
  Ok(())
}

fn print_tally<'a>(title: &str, entries: impl Iterator<Item = (&'a str, u64)>) {
  let mut entries: Vec<_> = entries.collect();
  if entries.is_empty() {
    return;
  }
  entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
  println!("{title}:");
  for (key, count) in entries {
    println!("  {key:<30} {}", format_count(count));
  }
}

fn user_agent() -> String {
  format!(
    "folio-cli/{} ({})",
    env!("CARGO_PKG_VERSION"),
    std::env::consts::OS
  )
}

/// Ask the server; answer locally if it cannot be reached.
async fn ask(client: &ApiClient, session: Option<String>, question: &str) -> Result<()> {
  let question = question.trim();
  anyhow::ensure!(!question.is_empty(), "question must not be empty");

  let (session_id, text) = match client.ask(question, session.as_deref()).await {
    Ok(reply) => (reply.session_id, reply.reply.content),
    Err(e) => {
      tracing::warn!(error = %e, "assistant unavailable, answering locally");
      let session_id = session.unwrap_or_else(new_session_id);
      (session_id, matcher::reply(question).text.to_string())
    }
  };

  println!("{text}");
  eprintln!("session: {session_id}");
  Ok(())
}

fn print_record(label: &str, record: &VisitorRecord) {
  println!(
    "{label}: {} (updated {})",
    format_count(record.count),
    record.last_updated.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
  );
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;
  use tokio::net::TcpListener;

  use super::*;

  async fn offline_client() -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(format!("http://{addr}")).unwrap()
  }

  fn parse(args: &[&str]) -> Command {
    Args::try_parse_from(std::iter::once("folio").chain(args.iter().copied()))
      .unwrap()
      .command
  }

  #[tokio::test]
  async fn ask_answers_locally_without_touching_state() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");

    let command = parse(&["ask", "what", "are", "his", "skills"]);
    run(command, offline_client().await, &state_dir).await.unwrap();

    assert!(!state_dir.exists());
  }

  #[tokio::test]
  async fn visit_track_leave_and_stats_offline() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().to_path_buf();

    for args in [
      &["visit", "--page", "/projects"][..],
      &["track", "link_click", "--detail", "github"],
      &["leave"],
      &["stats"],
      &["stats", "--export"],
    ] {
      run(parse(args), offline_client().await, &state_dir).await.unwrap();
    }

    let state = open_state(&state_dir, offline_client().await).await.unwrap();
    let log = state.analytics.log().await;
    assert!(log.current.is_none());
    assert_eq!(log.sessions.len(), 1);
    assert_eq!(log.sessions[0].page_views, 1);
    assert_eq!(log.interactions[0].action, "link_click");

    run(parse(&["stats", "--clear"]), offline_client().await, &state_dir)
      .await
      .unwrap();
    assert!(state.analytics.log().await.sessions.is_empty());
    assert!(state.tracker.state().await.unique_visitors.is_empty());
  }

  #[tokio::test]
  async fn track_without_session_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = run(parse(&["track", "click"]), offline_client().await, dir.path())
      .await
      .unwrap_err();
    assert!(err.to_string().contains("no active session"));
  }

  #[test]
  fn export_and_clear_conflict() {
    assert!(Args::try_parse_from(["folio", "stats", "--export", "--clear"]).is_err());
  }
}
