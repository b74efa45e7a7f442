#![forbid(unsafe_code)]

//! Command-line front end of the mirror download console.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mirror_console::{
    active_rows, history_rows, running_count, Command, ConsoleConfig, HttpTransport, JobRow,
    ModalContent, Notice, Session, Snapshot, SubmissionForm, SyncOutcome, View,
};
use mirror_core::LaunchConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mirrorctl")]
struct Args {
    /// API root of the orchestration service, e.g. http://127.0.0.1:5000/api
    #[arg(long, global = true)]
    api_root: Option<String>,

    /// TOML file with console settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Background sync period for `watch`.
    #[arg(long, global = true)]
    poll_interval_seconds: Option<u64>,

    /// Log level (env-filter syntax).
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Installable components and their suggested versions.
    Components,
    /// Active downloads and history.
    List,
    /// Start a new download.
    Submit {
        #[arg(long)]
        component: String,
        #[arg(long)]
        version: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        home_dir: String,
        #[arg(long)]
        final_registry: String,
        #[arg(long)]
        registry_auth_file: String,
        #[arg(long)]
        entitlement_key: Option<String>,
    },
    /// Run a job action: details, stop, retry, dismiss, logs or report.
    Job { action: String, id: String },
    /// Print a job list every time it changes, until Ctrl-C.
    Watch {
        #[arg(long, value_enum, default_value_t = WatchView::Active)]
        view: WatchView,
    },
    /// Disk and prerequisite diagnostics.
    SystemInfo {
        #[arg(long)]
        home_dir: Option<String>,
    },
    /// Service-side configuration file.
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
    /// Check prerequisites on the mirror host.
    Validate,
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    Get,
    Set {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum WatchView {
    Active,
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args)?;
    let transport = HttpTransport::new(&config.api_root)
        .with_context(|| format!("api root {}", config.api_root))?;
    let session = Session::new(Arc::new(transport), config);

    match args.cmd {
        Cmd::Components => {
            session.load_catalog().await?;
            for c in session.catalog().components() {
                println!("{:<32} {:<10} {}", c.name, c.typical_size, c.description);
                if !c.versions.is_empty() {
                    println!("{:<32} versions: {}", "", c.versions.join(", "));
                }
            }
        }
        Cmd::List => {
            sync_once(&session).await?;
            let snap = session.snapshot();
            print_rows("Active", &active_rows(&snap), running_count(&snap));
            print_rows("History", &history_rows(&snap), 0);
        }
        Cmd::Submit {
            component,
            version,
            name,
            filter,
            dry_run,
            home_dir,
            final_registry,
            registry_auth_file,
            entitlement_key,
        } => {
            let mut form = SubmissionForm {
                component,
                version,
                name,
                filter,
                dry_run,
                launch: LaunchConfig {
                    home_dir,
                    final_registry,
                    registry_auth_file,
                    entitlement_key,
                },
            };
            report(session.submit(&mut form).await)?;
        }
        Cmd::Job { action, id } => {
            let command = Command::parse(&action, id)?;
            sync_once(&session).await?;
            match session.execute(command).await {
                Some(notice) => report(notice)?,
                None => print_modal(&session)?,
            }
        }
        Cmd::Watch { view } => watch(&session, view).await?,
        Cmd::SystemInfo { home_dir } => {
            let home_dir =
                home_dir.unwrap_or_else(|| session.config().retry_defaults.home_dir.clone());
            let info = session.system_info(&home_dir).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Cmd::Config { cmd } => match cmd {
            ConfigCmd::Get => print!("{}", session.load_config().await?),
            ConfigCmd::Set { file } => {
                let text = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("read {}", file.display()))?;
                report(session.save_config(&text).await)?;
            }
        },
        Cmd::Validate => {
            let (notice, resp) = session.validate().await?;
            if let Some(output) = resp.output {
                println!("{output}");
            }
            report(notice)?;
        }
    }

    session.dispose().await;
    Ok(())
}

fn load_config(args: &Args) -> Result<ConsoleConfig> {
    let mut config = match &args.config {
        Some(path) => ConsoleConfig::load_from(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(api_root) = &args.api_root {
        config.api_root = api_root.clone();
    }
    if let Some(secs) = args.poll_interval_seconds {
        config.poll_interval_secs = secs;
    }
    Ok(config)
}

async fn sync_once(session: &Session<HttpTransport>) -> Result<()> {
    match session.refresh().await {
        SyncOutcome::Failed => bail!("could not load downloads from {}", session.config().api_root),
        _ => Ok(()),
    }
}

async fn watch(session: &Session<HttpTransport>, view: WatchView) -> Result<()> {
    for notice in session.init().await {
        eprintln!("{notice}");
    }
    session.show_view(match view {
        WatchView::Active => View::ActiveDownloads,
        WatchView::History => View::History,
    });
    info!(?view, "watching; Ctrl-C to stop");

    let mut shown = 0;
    loop {
        let snap = session.snapshot();
        if snap.generation != shown {
            shown = snap.generation;
            render(&snap, view);
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
        }
    }
    Ok(())
}

fn render(snap: &Snapshot, view: WatchView) {
    match view {
        WatchView::Active => print_rows("Active", &active_rows(snap), running_count(snap)),
        WatchView::History => print_rows("History", &history_rows(snap), 0),
    }
}

fn print_rows(title: &str, rows: &[JobRow], running: usize) {
    if running > 0 {
        println!("== {title} ({running} running) ==");
    } else {
        println!("== {title} ==");
    }
    if rows.is_empty() {
        println!("(none)");
    }
    for row in rows {
        let progress = row
            .progress
            .map(|p| format!(" {p:.0}%"))
            .unwrap_or_default();
        let actions: Vec<_> = row.actions.iter().map(|a| a.label()).collect();
        println!(
            "{:<36} {:<28} {:<11}{progress}  pid={} started={} ended={}  [{}]",
            row.id.as_str(),
            row.title,
            row.status.as_str(),
            row.pid,
            row.started,
            row.ended,
            actions.join(" | ")
        );
    }
}

fn print_modal(session: &Session<HttpTransport>) -> Result<()> {
    let Some(slot) = session.detail().current() else {
        return Ok(());
    };
    match slot.content {
        ModalContent::Details(detail) => {
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        ModalContent::Logs { text, .. } | ModalContent::Report { text, .. } => println!("{text}"),
        ModalContent::Error(message) => bail!(message),
        ModalContent::Loading => {}
    }
    Ok(())
}

fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        bail!(notice.message);
    }
    println!("{notice}");
    Ok(())
}
