use crate::design::{DesignDraft, KNOWN_CATEGORIES, canvas_data_url};
use crate::formatter::{format_history, format_loading, format_state};
use crate::workflow::{WorkflowController, WorkflowState};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
    pub handle_ctrl_c: bool,
    pub ctrl_c_message: Option<&'a str>,
}

pub const HELP_LINES: &[&str] = &[
    "text <prompt>        search by description",
    "canvas <image file>  search by sketch",
    "category <name|none> set the category hint (UI, Logo, Icon, Illustration)",
    "history              list past designs in this session",
    "state                show the current state",
    "dismiss              clear an error",
    "help                 show this help",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Text(String),
    Canvas(PathBuf),
    Category(Option<String>),
    History,
    State,
    Dismiss,
    Help,
}

pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "text" => Ok(ReplCommand::Text(rest.to_string())),
        "canvas" if rest.is_empty() => Err("Usage: canvas <image file>".to_string()),
        "canvas" => Ok(ReplCommand::Canvas(PathBuf::from(rest))),
        "category" => Ok(ReplCommand::Category(normalize_category(rest))),
        "history" => Ok(ReplCommand::History),
        "state" => Ok(ReplCommand::State),
        "dismiss" => Ok(ReplCommand::Dismiss),
        "help" | "?" => Ok(ReplCommand::Help),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

/// Map user input onto a known category (case-insensitive). Unknown names
/// pass through unchanged; blank or `none` clears the hint.
pub fn normalize_category(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    let known = KNOWN_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .map(|c| c.to_string());
    Some(known.unwrap_or_else(|| trimmed.to_string()))
}

/// Read an image file into a canvas design draft.
pub async fn canvas_draft(path: &Path) -> io::Result<DesignDraft> {
    let bytes = tokio::fs::read(path).await?;
    Ok(DesignDraft::canvas(canvas_data_url(&bytes, path)))
}

/// Print loading progress as the workflow publishes it. Consecutive
/// duplicate lines are skipped.
pub fn spawn_progress_printer(
    mut states: watch::Receiver<WorkflowState>,
    print: fn(&str),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        while states.changed().await.is_ok() {
            let line = match &*states.borrow_and_update() {
                WorkflowState::Loading(view) => format_loading(view),
                _ => continue,
            };
            if line != last {
                print(&line);
                last = line;
            }
        }
    })
}

struct ReplSession {
    category: Option<String>,
}

async fn execute_command(
    controller: &WorkflowController,
    session: &mut ReplSession,
    command: ReplCommand,
) -> Result<String, String> {
    match command {
        ReplCommand::Text(prompt) => {
            let draft = DesignDraft::text(prompt).with_category(session.category.clone());
            Ok(format_state(&controller.submit(draft).await))
        }
        ReplCommand::Canvas(path) => {
            let draft = canvas_draft(&path)
                .await
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?
                .with_category(session.category.clone());
            Ok(format_state(&controller.submit(draft).await))
        }
        ReplCommand::Category(category) => {
            let message = match &category {
                Some(c) => format!("Category set to {}", c),
                None => "Category cleared".to_string(),
            };
            session.category = category;
            Ok(message)
        }
        ReplCommand::History => Ok(format_history(&controller.history().await)),
        ReplCommand::State => Ok(format_state(&controller.state())),
        ReplCommand::Dismiss => {
            controller.dismiss();
            Ok(format_state(&controller.state()))
        }
        ReplCommand::Help => Ok(HELP_LINES.join("\n")),
    }
}

/// What one line of stdin means to the REPL.
enum ReplInput {
    Line(String),
    Blank,
    /// EOF, Ctrl-C or an exit command.
    Quit,
    Failed(io::Error),
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

async fn next_input(
    lines: &mut StdinLines,
    options: &ReplOptions<'_>,
    output: OutputHandlers,
) -> ReplInput {
    if !options.handle_ctrl_c {
        return interpret_line(lines.next_line().await, options.exit_commands);
    }
    tokio::select! {
        line = lines.next_line() => interpret_line(line, options.exit_commands),
        _ = tokio::signal::ctrl_c() => {
            if let Some(message) = options.ctrl_c_message {
                (output.out)(message);
            }
            ReplInput::Quit
        }
    }
}

/// Exit commands match case-insensitively.
fn interpret_line(line: io::Result<Option<String>>, exit_commands: &[&str]) -> ReplInput {
    let line = match line {
        Ok(Some(line)) => line,
        Ok(None) => return ReplInput::Quit,
        Err(e) => return ReplInput::Failed(e),
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        ReplInput::Blank
    } else if exit_commands.iter().any(|c| c.eq_ignore_ascii_case(trimmed)) {
        ReplInput::Quit
    } else {
        ReplInput::Line(trimmed.to_string())
    }
}

/// Interactive loop. All searches share the controller's session, so
/// `history` lists everything submitted here.
pub async fn run_repl(
    controller: &WorkflowController,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), Box<dyn Error>> {
    for line in options.banner_lines {
        (output.out)(line);
    }

    let printer = spawn_progress_printer(controller.subscribe(), output.err);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut session = ReplSession { category: None };

    loop {
        print!("{}", options.prompt);
        stdout.flush()?;

        match next_input(&mut lines, &options, output).await {
            ReplInput::Line(line) => match parse_command(&line) {
                Ok(command) => match execute_command(controller, &mut session, command).await {
                    Ok(result) => (output.out)(&result),
                    Err(err) => (output.err)(&format!("Error: {}", err)),
                },
                Err(err) => (output.err)(&err),
            },
            ReplInput::Blank => continue,
            ReplInput::Quit => break,
            ReplInput::Failed(e) => {
                printer.abort();
                return Err(e.into());
            }
        }
    }

    printer.abort();
    Ok(())
}
