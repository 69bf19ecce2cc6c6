//! `roster`: serves the roster API and sends occasion notifications.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `ROSTER_*` environment variables; nested keys use `__`, e.g.
//! `ROSTER_MAIL__SMTP_HOST`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use roster_core::date::MonthDay;
use roster_notify::{HttpMessenger, Notifier, SmtpMailer};
use roster_api::AppState;
use roster_server::ServerConfig;
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster occasions server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,
  /// Import a legacy JSON roster export into the store.
  Import {
    /// JSON file holding an array of legacy rows.
    file: PathBuf,
  },
  /// Assemble the digest for a day and print it, or mail it with `--send`.
  Digest {
    /// Month-day to use instead of today, e.g. `03-14`.
    #[arg(long)]
    date: Option<MonthDay>,
    #[arg(long)]
    send: bool,
  },
  /// Mail personal greetings to everyone celebrating on a day.
  Greet {
    #[arg(long)]
    date: Option<MonthDay>,
  },
  /// Send phone messages to everyone celebrating on a day.
  Message {
    #[arg(long)]
    date: Option<MonthDay>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("ROSTER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let offset = server_cfg.utc_offset().with_context(|| {
    format!("utc_offset_minutes out of range: {}", server_cfg.utc_offset_minutes)
  })?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  match cli.command {
    Command::Serve => {
      let app = roster_server::router(AppState::new(store, offset));
      let address = format!("{}:{}", server_cfg.host, server_cfg.port);

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }

    Command::Import { file } => {
      let report = store
        .import_legacy(&file)
        .await
        .with_context(|| format!("failed to import {file:?}"))?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Command::Digest { date, send } => {
      let date = date.unwrap_or_else(|| MonthDay::today(offset));
      let notifier = Notifier::new(store, server_cfg.notify_options());
      let digest = notifier.assemble_digest(date).await;

      if send {
        let mailer = mailer(&server_cfg)?;
        let report = notifier
          .send_digest(&digest, &mailer)
          .await
          .context("failed to send digest")?;
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        println!("{}", serde_json::to_string_pretty(&digest)?);
      }
    }

    Command::Greet { date } => {
      let date = date.unwrap_or_else(|| MonthDay::today(offset));
      let notifier = Notifier::new(store, server_cfg.notify_options());
      let mailer = mailer(&server_cfg)?;
      let report = notifier.send_greetings(date, &mailer).await;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Command::Message { date } => {
      let date = date.unwrap_or_else(|| MonthDay::today(offset));
      let notifier = Notifier::new(store, server_cfg.notify_options());
      let config = server_cfg
        .messages
        .clone()
        .context("no [messages] table configured; cannot send")?;
      let messenger = HttpMessenger::new(config).context("failed to build HTTP client")?;
      let report = notifier.send_messages(date, &messenger).await;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
  }

  Ok(())
}

fn mailer(cfg: &ServerConfig) -> anyhow::Result<SmtpMailer> {
  let mail = cfg
    .mail
    .as_ref()
    .context("no [mail] table configured; cannot send")?;
  SmtpMailer::new(mail).context("failed to configure SMTP")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
