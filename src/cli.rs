//! Line-oriented console for voxelurn.
//!
//! Reads one line at a time from stdin. Plain text is a command for the
//! parser; lines starting with `:` drive the session directly (the keys
//! of the graphical client, spelled out).
//!
//! Startup flags override `~/.voxelurn/config.toml`.

mod format;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::console::{Console, Output};
use crate::history::{HistoryJump, JumpKind};
use crate::identity::resolve_session_id;
use crate::interpret::{Interpreter, SempreClient, SessionContext};
use crate::logbook::{EventSink, JsonlSink};
use crate::model::{Task, WorldState};
use crate::session::{Session, StatusKind};

use format::{
    describe_cursor, format_candidates, format_error, format_history, format_notice, format_pins,
    format_status, format_suggestions, format_world,
};

/// voxelurn: build voxel worlds in natural language.
#[derive(Debug, Parser)]
#[command(name = "voxelurn", after_long_help = CONSOLE_HELP)]
pub struct Cli {
    /// Parser service URL (e.g. `http://localhost:8410`).
    #[arg(long)]
    server: Option<String>,

    /// Session id. Definitions you teach the parser are kept under it.
    #[arg(long)]
    session: Option<String>,

    /// Task to start in.
    #[arg(long, value_enum)]
    task: Option<TaskArg>,

    /// Seed for drawing targets, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Append product events to this file.
    #[arg(long)]
    event_log: Option<PathBuf>,
}

const CONSOLE_HELP: &str = r"Console:
  add red              interpret a command
  :up / :down          move through the interpretations
  :accept              accept the selected interpretation (Enter works too)
  :undo / :redo        move through history
  :jump <n>            jump to <n> steps before the latest
  :define              teach the parser the last command
  :complete [prefix]   edit the definition and list suggestions
  :esc                 leave the current mode
  :task world|target   switch task
  :history / :world    show history / the current world
  :quit";

/// CLI-facing task, mapped to the domain `Task`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskArg {
    /// Free building.
    World,
    /// Reproduce a drawn structure within a step budget.
    Target,
}

impl TaskArg {
    fn to_domain(self) -> Task {
        match self {
            Self::World => Task::World,
            Self::Target => Task::Target,
        }
    }
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Text(String),
    Up,
    Down,
    Accept,
    Undo,
    Redo,
    Jump(usize),
    Define,
    Complete(String),
    Esc,
    Task(Task),
    History,
    World,
    Help,
    Quit,
}

impl Line {
    fn parse(raw: &str) -> Result<Self, String> {
        let Some(rest) = raw.strip_prefix(':') else {
            return Ok(Self::Text(raw.trim().to_string()));
        };
        let (name, arg) = match rest.split_once(' ') {
            Some((name, arg)) => (name, arg),
            None => (rest.trim_end(), ""),
        };

        let line = match name {
            "up" => Self::Up,
            "down" => Self::Down,
            "accept" => Self::Accept,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "jump" => {
                let step_n = arg
                    .trim()
                    .parse()
                    .map_err(|_| format!("expected a step count, got '{}'", arg.trim()))?;
                Self::Jump(step_n)
            }
            "define" => Self::Define,
            // Keep trailing spaces: they ask for suggestions.
            "complete" => Self::Complete(arg.to_string()),
            "esc" => Self::Esc,
            "task" => match arg.trim() {
                "world" => Self::Task(Task::World),
                "target" => Self::Task(Task::Target),
                other => return Err(format!("unknown task '{other}', expected world or target")),
            },
            "history" => Self::History,
            "world" => Self::World,
            "help" => Self::Help,
            "quit" | "q" => Self::Quit,
            other => return Err(format!("unknown command ':{other}', try :help")),
        };
        Ok(line)
    }
}

/// Run the console, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    let server_url = cli.server.as_deref().unwrap_or(&config.server_url);
    let session_id = resolve_session_id(cli.session.as_deref(), config.session_id.as_deref());
    let interpreter = SempreClient::new(server_url)
        .map_err(|e| format!("failed to set up parser client: {e}"))?;

    let event_log = cli
        .event_log
        .clone()
        .or_else(|| config.event_log.clone())
        .or_else(JsonlSink::default_path)
        .ok_or("could not determine home directory")?;
    let sink = JsonlSink::new(&event_log)
        .map_err(|e| format!("failed to open event log {}: {e}", event_log.display()))?;

    let rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    info!(
        session_id = %session_id,
        server_url,
        event_log = %sink.path().display(),
        "session started"
    );
    let session = Session::new(SessionContext { session_id }, WorldState::empty(), rng);
    let mut console = Console::new(session, interpreter, sink);

    let task = cli.task.map_or(config.task, TaskArg::to_domain);
    if task == Task::Target {
        let outputs = console.set_task(Task::Target);
        show(&console, &outputs);
    }

    println!("{}", format_status(console.session()));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        prompt(console.session())?;
        let Some(raw) = lines.next() else {
            break;
        };
        let raw = raw.map_err(|e| format!("failed to read input: {e}"))?;

        let line = match Line::parse(&raw) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        debug!(?line, "console line");
        if line == Line::Quit {
            break;
        }
        let outputs = dispatch(&mut console, line);
        show(&console, &outputs);
    }

    Ok(())
}

fn dispatch<I: Interpreter, S: EventSink>(console: &mut Console<I, S>, line: Line) -> Vec<Output> {
    match line {
        Line::Text(text) => console.submit(&text),
        Line::Up => console.select_prev(),
        Line::Down => console.select_next(),
        Line::Accept => console.accept(),
        Line::Undo => console.undo(),
        Line::Redo => console.redo(),
        Line::Jump(step_n) => console.jump(HistoryJump {
            kind: JumpKind::Accept,
            step_n,
        }),
        Line::Define => console.open_define(),
        Line::Complete(prefix) => console.edit_define(&prefix),
        Line::Esc => {
            if !console.cancel() {
                println!("Nothing to cancel");
            }
            Vec::new()
        }
        Line::Task(task) => console.set_task(task),
        Line::History => {
            let history = console.session().history();
            for line in format_history(history) {
                println!("{line}");
            }
            println!("cursor: {}", describe_cursor(history.cursor()));
            for line in format_pins(console.session().pins()) {
                println!("{line}");
            }
            Vec::new()
        }
        Line::World => {
            println!("{}", format_world(console.session().current_world()));
            Vec::new()
        }
        Line::Help => {
            println!("{CONSOLE_HELP}");
            Vec::new()
        }
        Line::Quit => Vec::new(),
    }
}

fn show<I: Interpreter, S: EventSink>(console: &Console<I, S>, outputs: &[Output]) {
    for output in outputs {
        match output {
            Output::Notice(notice) => println!("{}", format_notice(notice)),
            Output::Error(error) => eprintln!("{}", format_error(error)),
            Output::Suggestions(suggestions) => {
                for line in format_suggestions(suggestions) {
                    println!("{line}");
                }
            }
        }
    }

    let session = console.session();
    for line in format_candidates(session.status()) {
        println!("{line}");
    }
    if let Some(preview) = session.preview() {
        println!("preview: {}", format_world(&preview));
    }
    println!("{}", format_status(session));
}

fn prompt(session: &Session) -> Result<(), String> {
    let mut stdout = io::stdout();
    let text = match session.status_kind() {
        StatusKind::Define => "define> ",
        StatusKind::Accept => "accept> ",
        StatusKind::Try | StatusKind::Loading => "> ",
    };
    if !session.input().is_empty() {
        println!("buffer: {}", session.input());
    }
    write!(stdout, "{text}").map_err(|e| format!("failed to write prompt: {e}"))?;
    stdout
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(
            Line::parse("  add red top  ").unwrap(),
            Line::Text("add red top".into())
        );
    }

    #[test]
    fn colon_commands() {
        assert_eq!(Line::parse(":up").unwrap(), Line::Up);
        assert_eq!(Line::parse(":accept").unwrap(), Line::Accept);
        assert_eq!(Line::parse(":q").unwrap(), Line::Quit);
        assert_eq!(Line::parse(":jump 3").unwrap(), Line::Jump(3));
        assert_eq!(
            Line::parse(":task target").unwrap(),
            Line::Task(Task::Target)
        );
    }

    #[test]
    fn complete_keeps_trailing_space() {
        assert_eq!(
            Line::parse(":complete add ").unwrap(),
            Line::Complete("add ".into())
        );
        assert_eq!(Line::parse(":complete").unwrap(), Line::Complete(String::new()));
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(Line::parse(":jump many").unwrap_err().contains("step count"));
        assert!(Line::parse(":task sculpt").unwrap_err().contains("unknown task"));
        assert!(Line::parse(":fly").unwrap_err().contains(":help"));
    }

    #[test]
    fn task_arg_maps_to_domain() {
        assert_eq!(TaskArg::Target.to_domain(), Task::Target);
        assert_eq!(TaskArg::World.to_domain(), Task::World);
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "voxelurn",
            "--server",
            "http://parser:9000",
            "--task",
            "target",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://parser:9000"));
        assert!(matches!(cli.task, Some(TaskArg::Target)));
        assert_eq!(cli.seed, Some(7));
    }
}
