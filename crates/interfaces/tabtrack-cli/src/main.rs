use anyhow::{bail, Context};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::time::Duration;
use tabtrack_app_core::{DashboardDocument, TrackerConfig};
use tabtrack_cli::commands::{self, EmitRequest, RunOptions};
use tabtrack_cli::{open_settings, settings};
use tabtrack_config::DEFAULT_PROJECT_NAME;
use tabtrack_core::Viewport;
use tokio::io::BufReader;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TABTRACK_SETTINGS")]
    settings: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the extension settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Check a deployment id with the collector
    Validate {
        #[arg(long)]
        page_url: String,
        #[arg(long, help = "Validate and save this id instead of the saved one")]
        deployment: Option<String>,
    },
    /// Send a single event
    Emit {
        #[arg(long)]
        page_url: String,
        #[arg(long, default_value = "NOOP")]
        kind: String,
        #[arg(long)]
        dashboard: String,
        #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
        project: String,
        #[arg(long)]
        referrer: Option<String>,
        #[arg(long, help = "JSON object merged into the payload")]
        data: Option<String>,
    },
    /// Validate a serialized event record ("-" reads stdin)
    #[command(name = "check-record")]
    CheckRecord { path: Utf8PathBuf },
    /// Run a tracking session over a dashboard, reading host notifications as JSON lines
    Run {
        #[arg(long)]
        page_url: String,
        #[arg(long, help = "Dashboard layout and current filters (JSON)")]
        dashboard: Utf8PathBuf,
        #[arg(long, help = "Notification file; stdin when omitted")]
        events: Option<Utf8PathBuf>,
        #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
        project: String,
        #[arg(long)]
        referrer: Option<String>,
        #[arg(long, default_value_t = 1920)]
        width: u32,
        #[arg(long, default_value_t = 1080)]
        height: u32,
        #[arg(long)]
        quiet_ms: Option<u64>,
        #[arg(long)]
        heartbeat_ms: Option<u64>,
        #[arg(long, help = "Keep running this long after the input ends")]
        linger_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    Show,
    #[command(name = "set-deployment")]
    SetDeployment { id: String },
    #[command(name = "set-workbook")]
    SetWorkbook { name: String },
    /// Edit custom user metadata
    Meta {
        #[command(subcommand)]
        command: MetaCommands,
    },
}

#[derive(Subcommand)]
enum MetaCommands {
    Add,
    Set { key: String, value: String },
    Rename { key: String, new_key: String },
    Remove { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("default subscriber")?;

    let settings_path = cli.settings.as_deref();

    match cli.command {
        Commands::Settings { command } => {
            let s = open_settings(settings_path)?;
            match command {
                SettingsCommands::Show => settings::handle_show(&s)?,
                SettingsCommands::SetDeployment { id } => settings::handle_set_deployment(&s, &id)?,
                SettingsCommands::SetWorkbook { name } => settings::handle_set_workbook(&s, &name)?,
                SettingsCommands::Meta { command } => match command {
                    MetaCommands::Add => settings::handle_meta_add(&s)?,
                    MetaCommands::Set { key, value } => {
                        settings::handle_meta_set(&s, &key, &value)?
                    }
                    MetaCommands::Rename { key, new_key } => {
                        settings::handle_meta_rename(&s, &key, &new_key)?
                    }
                    MetaCommands::Remove { key } => settings::handle_meta_remove(&s, &key)?,
                },
            }
        }
        Commands::Validate {
            page_url,
            deployment,
        } => {
            let s = open_settings(settings_path)?;
            if !commands::cmd_validate(&s, &page_url, deployment).await? {
                bail!("Deployment ID is not valid");
            }
        }
        Commands::Emit {
            page_url,
            kind,
            dashboard,
            project,
            referrer,
            data,
        } => {
            let s = open_settings(settings_path)?;
            let data = match data {
                Some(raw) => match serde_json::from_str::<Value>(&raw)
                    .context("--data is not valid JSON")?
                {
                    Value::Object(map) => map,
                    _ => bail!("--data must be a JSON object"),
                },
                None => Map::new(),
            };
            let record = commands::cmd_emit(
                &s,
                EmitRequest {
                    page_url,
                    kind,
                    dashboard_name: dashboard,
                    project_name: project,
                    referrer,
                    data,
                },
            )
            .await?;
            if cli.verbose {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::CheckRecord { path } => {
            let json = if path == "-" {
                let mut buf = String::new();
                std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?
            };
            let kind = commands::cmd_check_record(&json)?;
            println!("Record is valid ({kind}).");
        }
        Commands::Run {
            page_url,
            dashboard,
            events,
            project,
            referrer,
            width,
            height,
            quiet_ms,
            heartbeat_ms,
            linger_ms,
        } => {
            let s = open_settings(settings_path)?;
            let doc: DashboardDocument = serde_json::from_str(
                &std::fs::read_to_string(&dashboard)
                    .with_context(|| format!("Failed to read {dashboard}"))?,
            )
            .with_context(|| format!("{dashboard} is not a dashboard document"))?;

            let mut config = TrackerConfig::new(page_url.parse().context("Invalid page URL")?);
            config.project_name = project;
            config.referrer = referrer;
            config.viewport = Viewport { width, height };
            if let Some(ms) = quiet_ms {
                config.quiet_period = Duration::from_millis(ms);
            }
            if let Some(ms) = heartbeat_ms {
                config.heartbeat_period = Duration::from_millis(ms);
            }
            let linger = linger_ms
                .map(Duration::from_millis)
                .unwrap_or(config.quiet_period + Duration::from_millis(500));
            let opts = RunOptions { config, linger };

            let summary = match events {
                Some(path) => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .with_context(|| format!("Failed to open {path}"))?;
                    commands::cmd_run(&s, opts, doc, BufReader::new(file)).await?
                }
                None => {
                    commands::cmd_run(&s, opts, doc, BufReader::new(tokio::io::stdin())).await?
                }
            };
            if summary.rejected > 0 {
                eprintln!("{} notifications could not be sent", summary.rejected);
            }
        }
    }

    Ok(())
}
