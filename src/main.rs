use clap::{Parser, Subcommand};
use flathub_search_lib::actions::ActionExecutor;
use flathub_search_lib::commands::search::run_search;
use flathub_search_lib::config::Preferences;
use flathub_search_lib::models::{clean_argument, ItemAction, QueryEvent, ResultLimit};
use flathub_search_lib::output::{render_line, StdoutSink};
use flathub_search_lib::worker_pool::WorkerPool;
use flathub_search_lib::{build_extension, logger, Collaborators, Services};
use serde::Deserialize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "flathub-search", version, about = "Flathub/Flatpak search for launchers")]
struct Cli {
    /// Preferences file (JSON). Defaults to the per-user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Talk to a launcher over stdin/stdout, one JSON message per line
    Serve,
    /// One Flathub search, printed as JSON
    Search { query: Vec<String> },
    /// Search installed Flatpak apps, printed as JSON
    Local { query: Vec<String> },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum HostRequest {
    Query {
        keyword: String,
        #[serde(default)]
        argument: Option<String>,
    },
    Activate {
        action: ItemAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    if which::which("flatpak").is_err() {
        log::warn!("'flatpak' not found in PATH; installed state will always read as not installed");
    }

    let prefs = Preferences::load(cli.config.as_deref());
    let pool = match WorkerPool::new(prefs.workers) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Serve => serve(&pool, prefs),
        Command::Search { query } => search_once(&pool, &prefs, &query.join(" ")),
        Command::Local { query } => local_once(&pool, &prefs, &query.join(" ")),
    };

    pool.shutdown();
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn serve(pool: &WorkerPool, prefs: Preferences) -> Result<(), String> {
    let sink = Arc::new(StdoutSink::new());
    let extension = build_extension(prefs, pool.handle(), Collaborators::system(), sink.clone());
    let executor = ActionExecutor::default();

    log::info!("Serving launcher requests on stdin");
    let mut next_id: u64 = 0;
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("stdin: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let request: HostRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Ignoring malformed request: {}", e);
                continue;
            }
        };

        match request {
            HostRequest::Query { keyword, argument } => {
                next_id += 1;
                let event = QueryEvent {
                    id: next_id,
                    keyword,
                    argument,
                };
                let items = pool.block_on(extension.on_query(&event));
                sink.send(event.id, &items);
            }
            HostRequest::Activate { action } => {
                if let Err(e) = executor.execute(&action) {
                    log::error!("{}", e);
                }
            }
        }
    }
    sink.close();
    Ok(())
}

fn search_once(pool: &WorkerPool, prefs: &Preferences, query: &str) -> Result<(), String> {
    let services = Services::new(prefs, pool.handle(), Collaborators::system());
    let limit = ResultLimit::parse(&prefs.results_limit);
    let query = clean_argument(Some(query));
    let items = pool.block_on(run_search(
        &services.catalog,
        &services.pipeline,
        &services.presenter,
        &query,
        limit,
    ));
    println!("{}", render_line(0, &items)?);
    Ok(())
}

fn local_once(pool: &WorkerPool, prefs: &Preferences, query: &str) -> Result<(), String> {
    let services = Services::new(prefs, pool.handle(), Collaborators::system());
    let limit = ResultLimit::parse(&prefs.results_limit);
    let query = clean_argument(Some(query));
    let items = pool.block_on(async {
        let apps = services.packages.list_installed(&query, limit.get()).await;
        services.presenter.present_local(apps).await
    });
    println!("{}", render_line(0, &items)?);
    Ok(())
}
