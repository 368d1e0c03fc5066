use clap::{Parser, Subcommand};
use sketchseek_engine::backend::DesignBackend;
use sketchseek_engine::cli::{self, OutputHandlers, ReplOptions};
use sketchseek_engine::config::{ConfigLoader, SketchseekConfig};
use sketchseek_engine::design::DesignDraft;
use sketchseek_engine::formatter::{format_history, format_state};
use sketchseek_engine::history::HistoryClient;
use sketchseek_engine::http::HttpBackend;
use sketchseek_engine::protocol::SessionId;
use sketchseek_engine::workflow::{WorkflowController, WorkflowState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sketchseek", version, about = "Find designs from a description or a sketch")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./sketchseek.yaml, then ~/.sketchseek/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Search API base URL (overrides config and SKETCHSEEK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print the final state as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Category hint (UI, Logo, Icon, Illustration)
    #[arg(long)]
    category: Option<String>,

    /// Comma-separated provider ids
    #[arg(long, value_delimiter = ',')]
    providers: Option<Vec<String>>,

    /// Maximum number of results
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Search by text description
    Text {
        prompt: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search by sketch image
    Canvas {
        file: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// List past designs of a session
    History {
        #[arg(long)]
        session: String,
    },
    /// Interactive mode sharing one session
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::apply_env(ConfigLoader::load_from(path).await?, |key| {
            std::env::var(key).ok()
        }),
        None => ConfigLoader::load_default().await?,
    };
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }

    debug!("Using search API at {}", config.api.base_url);
    let backend: Arc<dyn DesignBackend> = Arc::new(HttpBackend::with_timeout(
        &config.api.base_url,
        config.api.request_timeout(),
    )?);

    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    match args.command {
        Command::Text { prompt, search } => {
            let draft = DesignDraft::text(prompt);
            run_search(backend, &config, draft, search, args.json, output).await
        }
        Command::Canvas { file, search } => {
            let draft = cli::canvas_draft(&file)
                .await
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?;
            run_search(backend, &config, draft, search, args.json, output).await
        }
        Command::History { session } => {
            let items = HistoryClient::new(backend)
                .fetch_history(&SessionId::new(session))
                .await;
            if args.json {
                (output.out)(&serde_json::to_string_pretty(&items)?);
            } else {
                (output.out)(&format_history(&items));
            }
            Ok(())
        }
        Command::Repl => {
            let controller =
                WorkflowController::new(backend, config.poll_config(), config.search_options());
            let options = ReplOptions {
                banner_lines: &[
                    "Describe a design ('text <prompt>') or load a sketch ('canvas <file>').",
                    "Type 'help' for commands, 'exit' or 'quit' to leave.",
                ],
                prompt: "> ",
                exit_commands: &["exit", "quit"],
                handle_ctrl_c: true,
                ctrl_c_message: Some("Bye."),
            };
            cli::run_repl(&controller, output, options)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))
        }
    }
}

async fn run_search(
    backend: Arc<dyn DesignBackend>,
    config: &SketchseekConfig,
    draft: DesignDraft,
    search: SearchArgs,
    json: bool,
    output: OutputHandlers,
) -> anyhow::Result<()> {
    let mut options = config.search_options();
    if let Some(providers) = search.providers {
        options.providers = providers;
    }
    if let Some(limit) = search.limit {
        options.limit = limit;
    }

    let draft = draft.with_category(search.category.as_deref().and_then(cli::normalize_category));
    let controller = WorkflowController::new(backend, config.poll_config(), options);
    let printer = cli::spawn_progress_printer(controller.subscribe(), output.err);

    let state = controller.submit(draft).await;
    printer.abort();

    if json {
        (output.out)(&serde_json::to_string_pretty(&state)?);
    } else if !matches!(state, WorkflowState::Error(_)) {
        (output.out)(&format_state(&state));
    }

    if let WorkflowState::Error(view) = state {
        return Err(anyhow::anyhow!(view.message));
    }
    Ok(())
}
