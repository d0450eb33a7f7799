use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use url::Url;

use reviewdesk_auth::CredentialStore;
use reviewdesk_core::{
    AnnotatedItem, App, AppError, Config, IntegrationRegistry, RefreshOutcome, RepositoryConfig,
    RouteOutcome, StopwatchTicker,
};
use reviewdesk_integrations::{GitLabIntegration, GitLabSource};

/// ReviewDesk - merge requests waiting for your review
#[derive(Parser)]
#[command(name = "reviewdesk")]
#[command(version)]
#[command(about = "Track merge requests waiting for your review", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(long, global = true, env = "REVIEWDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage watched repositories
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Show the review items of a repository (the selected one by default)
    Show {
        index: Option<usize>,

        /// Open the authorization page if sign-in is required
        #[arg(long)]
        open: bool,
    },

    /// Fetch a repository's items again
    Refresh { index: usize },

    /// Track time spent on an item
    #[command(subcommand)]
    Stopwatch(StopwatchCommand),

    /// Handle an authorization callback URL
    Callback { url: Url },

    /// Forget the stored credential of a provider
    Logout { provider: String },
}

#[derive(Debug, Subcommand)]
enum RepoCommand {
    /// Watch a GitLab project
    Add {
        /// Display name
        name: String,

        /// Project path (`group/project`) or URL
        project: String,

        /// Only show items carrying one of these labels
        #[arg(long = "label")]
        labels: Vec<String>,
    },

    /// List watched repositories
    List,
}

#[derive(Debug, Subcommand)]
enum StopwatchCommand {
    Start { url: String },
    Pause { url: String },
    Reset { url: String },
    /// Print the running reading until interrupted
    Watch { url: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = reviewdesk_core::init() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let args = Args::parse();
    match start(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn start(args: Args) -> Result<(), AppError> {
    let (config, _) = Config::load_validated(args.config.as_deref())?;
    let app = build_app(config)?;

    run(&app, args.command).await
}

fn build_app(config: Config) -> Result<App> {
    let store: Arc<dyn reviewdesk_core::KeyValueStore> =
        Arc::new(reviewdesk_core::FileStore::new(config.storage_dir.clone()));

    let mut integrations = IntegrationRegistry::new();
    integrations.register(Arc::new(GitLabIntegration::new(
        &config.gitlab,
        CredentialStore::new(store.clone()),
    )?));

    App::with_store(config, integrations, store)
}

async fn run(app: &App, command: Command) -> Result<(), AppError> {
    match command {
        Command::Repo(RepoCommand::Add {
            name,
            project,
            labels,
        }) => {
            let source = GitLabSource::new(&project, labels)?;
            let index = app.repositories().add(RepositoryConfig {
                name,
                integration_id: "gitlab".to_string(),
                source: source.to_value(),
            })?;
            println!("Added repository #{} ({})", index, source.repository_path);
        }
        Command::Repo(RepoCommand::List) => {
            let selected = app.repositories().selected();
            for (index, entry) in app.repositories().entries().iter().enumerate() {
                let marker = if selected == Some(index) { "*" } else { " " };
                println!(
                    "{} {:>2}  {}  [{}]",
                    marker, index, entry.config.name, entry.config.integration_id
                );
            }
        }
        Command::Show { index, open } => {
            let index = match index.or(app.repositories().selected()) {
                Some(index) => index,
                None => {
                    println!("No repositories yet. Use 'reviewdesk repo add' first.");
                    return Ok(());
                }
            };
            if let Some(outcome) = app.repositories().select(index).await? {
                if !report_refresh(outcome, open)? {
                    return Ok(());
                }
            }
            let items = app
                .repositories()
                .annotated(index, app.stopwatches(), chrono::Utc::now())?;
            print_items(&items);
        }
        Command::Refresh { index } => {
            let outcome = app.repositories().refresh(index).await?;
            report_refresh(outcome, false)?;
        }
        Command::Stopwatch(command) => run_stopwatch(app, command).await?,
        Command::Callback { url } => match app.handle_navigation(&url)? {
            Some(RouteOutcome::Reload { location }) => {
                println!("Signed in. Continue at {}", location)
            }
            Some(RouteOutcome::Nothing) => println!("Callback carried no credential"),
            None => println!("No integration handles {}", url.path()),
        },
        Command::Logout { provider } => {
            CredentialStore::new(app.store()).delete_token(&provider)?;
            println!("Signed out of {}", provider);
        }
    }

    Ok(())
}

/// Print what a refresh did. Returns `false` if there is nothing to show.
fn report_refresh(outcome: RefreshOutcome, open: bool) -> Result<bool, AppError> {
    match outcome {
        RefreshOutcome::Updated { count } => {
            tracing::debug!("Refreshed {} items", count);
            Ok(true)
        }
        RefreshOutcome::AlreadyLoading => {
            println!("Already loading");
            Ok(true)
        }
        RefreshOutcome::AuthRequired { authorize_url } => {
            println!("Sign-in required. Visit:\n  {}", authorize_url);
            println!("then pass the URL you land on to 'reviewdesk callback'.");
            if open {
                reviewdesk_auth::open_in_browser(&authorize_url)?;
            }
            Ok(false)
        }
    }
}

fn print_items(items: &[AnnotatedItem]) {
    if items.is_empty() {
        println!("Nothing to review");
        return;
    }

    let dim = std::io::stdout().is_terminal();
    for annotated in items {
        let item = &annotated.item;
        let labels: Vec<&str> = item.labels.iter().map(|l| l.title.as_str()).collect();
        let line = format!(
            "{:<3} {:<8} {}  {}{}",
            item.status.icon().unwrap_or(""),
            annotated.elapsed,
            item.name,
            item.url,
            if labels.is_empty() { String::new() } else { format!("  [{}]", labels.join(", ")) }
        );
        if dim && annotated.is_dimmed() {
            println!("\x1b[2m{}\x1b[0m", line);
        } else {
            println!("{}", line);
        }
    }
}

async fn run_stopwatch(app: &App, command: StopwatchCommand) -> Result<(), AppError> {
    let stopwatches = app.stopwatches();
    match command {
        StopwatchCommand::Start { url } => {
            if !stopwatches.start(&url)? {
                println!("Already running");
            }
        }
        StopwatchCommand::Pause { url } => {
            if stopwatches.pause(&url)? {
                println!("Paused at {}", stopwatches.state(&url).display_at(chrono::Utc::now()));
            } else {
                println!("Not running");
            }
        }
        StopwatchCommand::Reset { url } => {
            stopwatches.reset(&url)?;
        }
        StopwatchCommand::Watch { url } => {
            let state = stopwatches.state(&url);
            if !state.is_running() {
                println!("Not running ({})", state.display_at(chrono::Utc::now()));
                return Ok(());
            }

            let period = Duration::from_millis(app.config().stopwatch.tick_millis);
            let _ticker = StopwatchTicker::spawn(stopwatches.clone(), url, period, |reading| {
                println!("{}", reading);
            });
            tokio::signal::ctrl_c().await?;
        }
    }

    Ok(())
}
