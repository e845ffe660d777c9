//! Arbius task explorer
//!
//! - `explorer task <TASKID>` prints one task page to the terminal
//! - `explorer serve` serves task pages over HTTP

mod server;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use arbius_core::TaskId;
use arbius_host::{
    render_text, Config, GraphQlVoteReader, JsonRpcClient, Links, TaskSession, TemplateRegistry,
    ViewComposer, Viewer,
};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, warn};

/// Upper bound on waiting for a task's reads before rendering what is known
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file; environment variables override it
    #[arg(long, global = true, env = "EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a single task
    Task(TaskArgs),
    /// Serve task pages over HTTP
    Serve,
}

#[derive(Args, Debug)]
struct TaskArgs {
    /// Task id (32-byte hex)
    taskid: String,

    /// Keep the page open and re-render on every update
    #[arg(long)]
    watch: bool,

    /// Connected account whose token balance is shown
    #[arg(long)]
    account: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    config.validate()?;

    match cli.command {
        Command::Task(args) => show_task(config, args).await,
        Command::Serve => server::serve(config).await,
    }
}

async fn show_task(config: Config, args: TaskArgs) -> Result<()> {
    let client = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
    let votes = Arc::new(GraphQlVoteReader::new(config.subgraph_url.clone(), &config.vote_network));
    let links = Links::from_config(&config);
    let templates = TemplateRegistry::from_config(&config)?;

    let task = TaskId::from_route(Some(&args.taskid));
    if task.is_none() {
        warn!(taskid = %args.taskid, "Not a task id; nothing to load");
    }

    let mut session = TaskSession::new(client, votes, &config, Viewer { account: args.account });
    session.set_task(task);

    if !args.watch {
        if tokio::time::timeout(SETTLE_TIMEOUT, session.settled()).await.is_err() {
            warn!("Some reads are still pending after {:?}", SETTLE_TIMEOUT);
        }
        print!("{}", render_text(&session.view(&links, &templates, unix_now())));
        return Ok(());
    }

    info!("Watching task, press Ctrl-C to stop");
    let mut updates = session.subscribe_updates();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let view = {
            let state = updates.borrow_and_update();
            ViewComposer::compose(&state, &links, &templates, unix_now())
        };
        println!("{}", render_text(&view));

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Stopping");
                break;
            }
        }
    }
    Ok(())
}

pub(crate) fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
