//! NovAi - chat with a Snowflake table in plain language.

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use novai::cli::Cli;
use novai::config::Config;
use novai::db::{self, MockWarehouseClient, WarehouseClient};
use novai::error::{NovaiError, Result};
use novai::llm::{CompletionClient, CortexClient, MockCompletionClient};
use novai::logging;
use novai::pipeline::{ChatPipeline, Notice, NoticeLevel, TurnOutcome};
use novai::render::{export_csv, OutputFormat, TurnRenderer};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

/// Commands that end the interactive chat.
const QUIT_COMMANDS: [&str; 3] = ["/quit", "/exit", "/q"];

/// Prompt shown by the interactive chat.
const PROMPT: &str = "> ";

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Stdout carries the chat itself in interactive mode.
    if cli.is_one_shot() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from: {}", path.display());
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.parse_output_format().map_err(NovaiError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    // Precedence: CLI flags, then the config file, then the environment.
    cli.apply_to(&mut config);
    config.warehouse.apply_env_defaults();

    let (warehouse, completion) = build_clients(&cli, &config)?;
    info!(
        target_table = %config.target.qualified_name(),
        model = completion.model(),
        "Starting chat"
    );

    let mut pipeline = ChatPipeline::new(warehouse.clone(), completion, config.target.clone())
        .with_summaries(config.completion.summarize);
    if let Some(context) = &config.completion.context {
        pipeline = pipeline.with_context(context.clone());
    }
    let session = Session {
        pipeline,
        renderer: TurnRenderer::new(format).with_prompt(cli.show_prompt),
        format,
        export_dir: cli.export_dir.as_deref(),
    };

    let result = match &cli.query {
        Some(text) => session.turn(text).await,
        None => session.repl().await,
    };

    if let Err(e) = warehouse.close().await {
        warn!(error = %e, "Failed to close warehouse client");
    }
    result
}

/// Creates the warehouse and completion clients, shared for the whole session.
fn build_clients(
    cli: &Cli,
    config: &Config,
) -> Result<(Arc<dyn WarehouseClient>, Arc<dyn CompletionClient>)> {
    if cli.mock {
        info!("Using in-memory warehouse and completion service");
        return Ok((
            Arc::new(MockWarehouseClient::new()),
            Arc::new(MockCompletionClient::new()),
        ));
    }

    info!("Warehouse: {}", config.warehouse.display_string());
    let warehouse = db::connect(&config.warehouse, &config.target)?;
    let completion = CortexClient::new(warehouse.clone(), config.completion.model.clone());
    Ok((warehouse, Arc::new(completion)))
}

struct Session<'a> {
    pipeline: ChatPipeline,
    renderer: TurnRenderer,
    format: OutputFormat,
    export_dir: Option<&'a Path>,
}

impl Session<'_> {
    /// Runs one chat turn and prints its output.
    async fn turn(&self, text: &str) -> Result<()> {
        let mut outcome = self.pipeline.run_turn(text).await;
        if let Some(dir) = self.export_dir {
            export_turn(&mut outcome, dir);
        }

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(self.renderer.format(&outcome).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| NovaiError::internal(format!("Failed to write output: {e}")))
    }

    /// Runs the chat until EOF or a quit command.
    ///
    /// A text-mode terminal gets line editing and history; anything else is
    /// read line by line without a prompt.
    async fn repl(&self) -> Result<()> {
        if self.format == OutputFormat::Text {
            println!(
                "Ask me about {} (/quit to exit)",
                self.pipeline.target().qualified_name()
            );
        }

        if self.format == OutputFormat::Text && std::io::stdin().is_terminal() {
            self.read_interactive().await?;
        } else {
            self.read_piped().await?;
        }

        info!("Chat ended");
        Ok(())
    }

    async fn read_interactive(&self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| NovaiError::internal(format!("Failed to start line editor: {e}")))?;
        let history_path = logging::get_history_path();
        if let Err(e) = editor.load_history(&history_path) {
            debug!(error = %e, "No chat history loaded");
        }

        loop {
            // Ctrl-C and Ctrl-D both end the chat.
            let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(NovaiError::internal(format!("Failed to read input: {e}")));
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if let Err(e) = editor.add_history_entry(text) {
                debug!(error = %e, "Failed to add history entry");
            }
            if QUIT_COMMANDS.contains(&text) {
                break;
            }
            self.turn(text).await?;
        }

        save_history(&mut editor, &history_path);
        Ok(())
    }

    async fn read_piped(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| NovaiError::internal(format!("Failed to read stdin: {e}")))?
        {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if QUIT_COMMANDS.contains(&text) {
                break;
            }
            self.turn(text).await?;
        }
        Ok(())
    }
}

fn save_history(editor: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(error = %e, "Failed to create history directory");
            return;
        }
    }
    if let Err(e) = editor.save_history(path) {
        warn!(error = %e, "Failed to save chat history");
    }
}

/// Writes a non-empty result to the export directory, noting the outcome.
fn export_turn(outcome: &mut TurnOutcome, dir: &Path) {
    if outcome.result.is_empty() {
        return;
    }

    let notice = match export_csv(&outcome.result, dir) {
        Ok(path) => Notice {
            level: NoticeLevel::Info,
            message: format!("Results saved to {}", path.display()),
        },
        Err(e) => {
            warn!(error = %e, "CSV export failed");
            Notice {
                level: NoticeLevel::Error,
                message: format!("Failed to export results: {e}"),
            }
        }
    };
    outcome.notices.push(notice);
}
