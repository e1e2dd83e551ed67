//! CLI interface for drawbot.
//!
//! Each subcommand is non-interactive: arguments in, structured output out.
//! The working timeline lives in the data directory between runs, so
//! `draw`, `undo`, `redo`, and friends pick up where the last run stopped.
//!
//! The AI round-trip happens outside drawbot: `draw` takes the prompt and
//! the model's raw reply (from `--response` or stdin) and validates it.

mod format;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;

use crate::config::Config;
use crate::render::{self, Pixmap, Surface};
use crate::session::Session;
use crate::storage::Storage;
use crate::user::{parse_user, resolve_user};
use crate::validate::parse_drawing_id;

use format::{format_command, format_group_summary, yes_no};

/// drawbot: turn prompts into drawings, with undo.
#[derive(Debug, Parser)]
#[command(name = "drawbot", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Act as this user (UUID). Switching users clears the timeline.
    /// Falls back to `DRAWBOT_USER`, then `default-user` in the config.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Log debug output to stderr. `DRAWBOT_LOG` takes precedence.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. drawbot user select 5f0c...e1
  2. my-llm "a red sun over the sea" | drawbot draw "a red sun over the sea"
  3. drawbot undo / drawbot redo
  4. drawbot render --out sun.png
  5. drawbot save            → prints a drawing ID
  6. drawbot load <drawing-id>

Commands the model may return (a JSON array):
  {"type":"circle","x":450,"y":120,"radius":60,"color":"red"}
  {"type":"line","from":{"x":0,"y":300},"to":{"x":900,"y":300},"width":3}
  {"type":"rect","x":0,"y":300,"width":900,"height":160,"color":"blue"}"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a model reply as a new step on the timeline.
    ///
    /// Elements that are not valid commands are dropped; the reply as a
    /// whole must be a JSON array. Anything after the cursor is discarded.
    Draw {
        /// The prompt the reply answers.
        prompt: String,

        /// Read the reply from this file instead of stdin.
        #[arg(long)]
        response: Option<PathBuf>,
    },

    /// Step back one prompt.
    Undo,

    /// Step forward one prompt.
    Redo,

    /// Empty the timeline. Saved drawings are kept.
    Clear,

    /// Show the visible drawing: prompts, commands, and undo/redo state.
    Show {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Render the visible drawing to a PNG.
    Render {
        /// Output file.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Render a raw JSON command array to a PNG without touching the timeline.
    ///
    /// Elements that are not drawable commands are skipped.
    Preview {
        /// File holding a JSON array of commands.
        file: PathBuf,

        /// Output file.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Select or clear the current user.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Save the visible drawing for the current user. Prints the drawing ID.
    Save,

    /// Replace the timeline with a saved drawing.
    Load {
        /// Drawing ID (a UUID).
        drawing_id: String,
    },

    /// List the current user's saved drawings.
    Saved {
        /// Fetch the list from storage first (newest first, at most 100).
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Select a user. Clears the timeline and the saved-drawings list.
    Select {
        /// User ID (a UUID).
        id: String,
    },

    /// Deselect the current user.
    Clear,
}

/// Output size overrides; the config's canvas size is the default.
#[derive(Debug, clap::Args)]
pub struct SizeArgs {
    /// Image width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

impl SizeArgs {
    fn pixmap(&self, config: &Config) -> Result<Pixmap, String> {
        let width = self.width.unwrap_or(config.canvas_width);
        let height = self.height.unwrap_or(config.canvas_height);
        Pixmap::new(width, height).map_err(|e| e.to_string())
    }
}

/// Run a parsed command line, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    let snapshot = storage
        .load_session()
        .map_err(|e| format!("failed to load session: {e}"))?;

    // The configured default only seeds a brand-new session.
    let fallback = config.default_user.filter(|_| snapshot.is_none());
    let mut session = match snapshot {
        Some(snapshot) => Session::resume(storage, snapshot),
        None => Session::new(storage),
    };
    let user_before = session.user();
    if let Some(user) = resolve_user(cli.user.as_deref(), fallback)? {
        session.select_user(Some(user));
    }

    let changed = match cli.command {
        Command::Draw { prompt, response } => {
            cmd_draw(&mut session, &prompt, response.as_deref())?;
            true
        }
        Command::Undo => {
            session.undo();
            print_position(&session);
            true
        }
        Command::Redo => {
            session.redo();
            print_position(&session);
            true
        }
        Command::Clear => {
            session.clear();
            eprintln!("Timeline cleared");
            true
        }
        Command::Show { json } => {
            cmd_show(&session, json)?;
            false
        }
        Command::Render { out, size } => {
            cmd_render(&session, &out, &size, config)?;
            false
        }
        Command::Preview { file, out, size } => {
            cmd_preview(&file, &out, &size, config)?;
            false
        }
        Command::User { command } => {
            cmd_user(&mut session, command)?;
            true
        }
        Command::Save => {
            let id = session.save().map_err(|e| format!("save failed: {e}"))?;
            println!("{id}");
            true
        }
        Command::Load { drawing_id } => {
            let id = parse_drawing_id(&drawing_id)
                .ok_or_else(|| format!("'{drawing_id}' is not a valid drawing ID"))?;
            session.load(id).map_err(|e| format!("load failed: {e}"))?;
            eprintln!("Drawing {} loaded", &id.to_string()[..8]);
            true
        }
        Command::Saved { refresh } => {
            if refresh {
                let count = session
                    .load_for_user()
                    .map_err(|e| format!("load failed: {e}"))?;
                info!(count, "saved drawings refreshed");
            }
            cmd_saved(&session);
            refresh
        }
    };

    // A user switch from --user or DRAWBOT_USER sticks even for read-only commands.
    if changed || session.user() != user_before {
        storage
            .save_session(&session.snapshot())
            .map_err(|e| format!("failed to save session: {e}"))?;
    }
    Ok(())
}

fn cmd_draw(
    session: &mut Session<'_, Storage>,
    prompt: &str,
    response: Option<&Path>,
) -> Result<(), String> {
    let raw = match response {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => io::read_to_string(io::stdin())
            .map_err(|e| format!("failed to read stdin: {e}"))?,
    };

    session
        .generate(prompt, &raw)
        .map_err(|e| format!("draw failed: {e}"))?;

    let history = session.state().history();
    let added = history.last().map_or(0, |group| group.commands.len());
    eprintln!("Applied {added} command(s) as step {}", history.len());
    Ok(())
}

fn print_position(session: &Session<'_, Storage>) {
    let state = session.state();
    let step = state.cursor().map_or(0, |i| i + 1);
    eprintln!(
        "At step {step} of {} (undo: {}, redo: {})",
        state.history().len(),
        yes_no(state.can_undo()),
        yes_no(state.can_redo())
    );
}

fn cmd_show(session: &Session<'_, Storage>, as_json: bool) -> Result<(), String> {
    let state = session.state();
    let commands = state.visible_commands();

    if as_json {
        let value = json!({
            "user": session.user(),
            "userIn": state.user_in(),
            "currentIndex": state.current_index(),
            "steps": state.history().len(),
            "canUndo": state.can_undo(),
            "canRedo": state.can_redo(),
            "prompts": state.visible_prompt_transcript(),
            "commands": commands,
        });
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| format!("failed to serialize: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    match session.user() {
        Some(user) => println!("user:     {user}"),
        None => println!("user:     (none)"),
    }
    print_position(session);

    if state.visible_groups().is_empty() {
        println!("Nothing drawn");
        return Ok(());
    }

    println!("prompts:");
    for line in state.visible_prompt_transcript().lines() {
        println!("  {line}");
    }
    println!("commands ({}):", commands.len());
    for command in &commands {
        println!("  {}", format_command(command));
    }
    Ok(())
}

fn cmd_render(
    session: &Session<'_, Storage>,
    out: &Path,
    size: &SizeArgs,
    config: &Config,
) -> Result<(), String> {
    let mut pixmap = size.pixmap(config)?;
    let commands = session.visible_commands();
    render::render(&mut pixmap, &commands);
    if pixmap.is_blank() {
        eprintln!("Nothing visible; writing an empty image");
    }
    write_png(&pixmap, out)?;
    eprintln!(
        "Rendered {} command(s) → {} ({}x{})",
        commands.len(),
        out.display(),
        pixmap.width(),
        pixmap.height()
    );
    Ok(())
}

fn cmd_preview(file: &Path, out: &Path, size: &SizeArgs, config: &Config) -> Result<(), String> {
    let text = fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not JSON: {e}", file.display()))?;
    let Value::Array(elements) = value else {
        return Err(format!("{} does not hold a JSON array", file.display()));
    };

    let mut pixmap = size.pixmap(config)?;
    render::render_values(&mut pixmap, &elements);
    write_png(&pixmap, out)?;
    eprintln!(
        "Previewed {} element(s) → {} ({}x{})",
        elements.len(),
        out.display(),
        pixmap.width(),
        pixmap.height()
    );
    Ok(())
}

fn write_png(pixmap: &Pixmap, out: &Path) -> Result<(), String> {
    pixmap
        .save_png(out)
        .map_err(|e| format!("failed to write {}: {e}", out.display()))
}

fn cmd_user(session: &mut Session<'_, Storage>, command: UserCommand) -> Result<(), String> {
    match command {
        UserCommand::Select { id } => {
            let user = parse_user(&id, "user select")?;
            session.select_user(Some(user));
            eprintln!("User {} selected", &user.to_string()[..8]);
        }
        UserCommand::Clear => {
            session.select_user(None);
            eprintln!("No user selected");
        }
    }
    Ok(())
}

fn cmd_saved(session: &Session<'_, Storage>) {
    let saved = session.state().saved_drawings();
    if saved.is_empty() {
        println!("No saved drawings");
        return;
    }
    for (i, group) in saved.iter().enumerate() {
        println!("{:>3}  {}", i + 1, format_group_summary(group));
    }
}
