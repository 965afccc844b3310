//! Terminal input handling.
//!
//! Wraps rustyline configuration and completion for the handful of words the game
//! understands, with a plain stdin fallback when no TTY is attached. Every decision point in
//! the engine reads through [`read_token`], which also handles the tokens that are valid
//! everywhere (`stats`, `inventory`, `quit`).

use std::collections::VecDeque;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

use crate::error::{EngineError, EngineResult};
use crate::player::Player;
use crate::style::GameStyle;
use crate::view::View;

/// Outcome of reading a line from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Anything that can answer a prompt with a line of text.
pub trait InputSource {
    /// Show `prompt` and wait for the next line.
    ///
    /// # Errors
    /// Returns any I/O error from the underlying reader.
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent>;
}

const COMPLETION_TERMS: &[&str] = &["attack", "flee", "fight", "inspect", "inventory", "quit", "stats"];

/// Read the next meaningful token for a decision point.
///
/// The pending view is flushed first. Input is trimmed and lowercased; blank lines are
/// ignored. `stats` and `inventory` show the player summary and ask again.
///
/// # Errors
/// - `Quit` on `quit`, end of input, or Ctrl-C
/// - `Input` if the reader fails
pub fn read_token(
    input: &mut dyn InputSource,
    view: &mut View,
    player: &Player,
    prompt: &str,
) -> EngineResult<String> {
    let prompt = format!("{} ", prompt.prompt_style());
    loop {
        view.flush();
        let line = match input.read_line(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => {
                info!("input closed; quitting");
                return Err(EngineError::Quit);
            },
        };
        let token = line.trim().to_lowercase();
        match token.as_str() {
            "" => continue,
            "quit" => return Err(EngineError::Quit),
            "stats" => player.show_stats(view),
            "inventory" => player.show_inventory(view),
            _ => return Ok(token),
        }
    }
}

/// Replays a fixed list of lines, then reports end of input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<InputEvent> {
        Ok(self.lines.pop_front().map_or(InputEvent::Eof, InputEvent::Line))
    }
}

type GameEditor = rustyline::Editor<DustbowlHelper, DefaultHistory>;

#[derive(Default)]
struct DustbowlHelper;

impl Helper for DustbowlHelper {}

impl Completer for DustbowlHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, prefix) = current_prefix(line, pos);
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }
        Ok((start, completions(&prefix.to_lowercase())))
    }
}

impl Hinter for DustbowlHelper {
    type Hint = String;
}

impl Highlighter for DustbowlHelper {}

impl Validator for DustbowlHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

fn current_prefix(line: &str, pos: usize) -> (usize, String) {
    let slice = &line[..pos];
    let trimmed = slice.trim_start_matches(char::is_whitespace);
    let start = pos - trimmed.len();
    (start, trimmed.to_string())
}

fn completions(lower: &str) -> Vec<Pair> {
    COMPLETION_TERMS
        .iter()
        .filter(|term| term.starts_with(lower))
        .map(|term| Pair {
            display: (*term).to_string(),
            replacement: (*term).to_string(),
        })
        .collect()
}

/// Manages the interactive input backend.
///
/// Prefers `rustyline` when an interactive terminal is available, falling back to
/// a basic stdin reader otherwise.
pub struct InputManager {
    backend: Backend,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        let backend = if io::stdin().is_terminal() {
            match RustylineInput::new() {
                Ok(editor) => {
                    info!("using rustyline-backed input");
                    Backend::Rustyline(editor)
                },
                Err(err) => {
                    warn!("failed to initialize rustyline ({err}), falling back to basic stdin");
                    Backend::plain()
                },
            }
        } else {
            info!("stdin is not a TTY; using basic input mode");
            Backend::plain()
        };

        Self { backend }
    }
}

impl InputSource for InputManager {
    /// If the interactive backend fails, switch to plain stdin and retry once.
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.backend.read_line(prompt) {
            Ok(event) => Ok(event),
            Err(err) if self.backend.is_rustyline() => {
                warn!("rustyline input failed: {err} -- switching to basic stdin");
                self.backend = Backend::plain();
                self.backend.read_line(prompt)
            },
            Err(err) => Err(err),
        }
    }
}

enum Backend {
    Rustyline(Box<RustylineInput>),
    Plain(PlainStdin),
}

impl Backend {
    fn plain() -> Self {
        Backend::Plain(PlainStdin)
    }

    fn is_rustyline(&self) -> bool {
        matches!(self, Backend::Rustyline(_))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self {
            Backend::Rustyline(editor) => editor.read_line(prompt),
            Backend::Plain(stdin) => stdin.read_line(prompt),
        }
    }
}

/// Entries kept in the on-disk history.
const HISTORY_LIMIT: usize = 200;

struct RustylineInput {
    editor: GameEditor,
    history: Option<HistoryFile>,
}

impl RustylineInput {
    fn new() -> io::Result<Box<Self>> {
        let config = rustyline::Config::builder()
            .max_history_size(HISTORY_LIMIT)
            .and_then(|builder| builder.history_ignore_dups(true))
            .map_err(readline_io_err)?
            .build();
        let mut editor = GameEditor::with_config(config).map_err(readline_io_err)?;
        editor.set_helper(Some(DustbowlHelper));
        let history = HistoryFile::locate();
        if let Some(history) = history.as_ref() {
            history.load_into(&mut editor);
        }
        Ok(Box::new(Self { editor, history }))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if worth_remembering(&line) {
                    if let Err(err) = self.editor.add_history_entry(line.trim()) {
                        warn!("failed to append to history: {err}");
                    }
                    if let Some(history) = self.history.as_ref() {
                        history.save_from(&mut self.editor);
                    }
                }
                Ok(InputEvent::Line(line))
            },
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(readline_io_err(err)),
        }
    }
}

/// Menu picks are bare numbers and not worth recalling; words (`flee`, `stats`) are.
fn worth_remembering(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Persistent command history under the user's local data directory.
struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    fn locate() -> Option<Self> {
        dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .map(|base| Self::under(&base))
    }

    fn under(base: &Path) -> Self {
        Self {
            path: base.join("dustbowl").join("input_history.txt"),
        }
    }

    fn load_into(&self, editor: &mut GameEditor) {
        if let Some(dir) = self.path.parent()
            && let Err(err) = fs::create_dir_all(dir)
        {
            warn!("cannot create history directory {}: {err}", dir.display());
            return;
        }
        match editor.load_history(&self.path) {
            Ok(()) => info!("history loaded from {}", self.path.display()),
            Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {},
            Err(err) => warn!("ignoring unreadable history {}: {err}", self.path.display()),
        }
    }

    fn save_from(&self, editor: &mut GameEditor) {
        if let Err(err) = editor.save_history(&self.path) {
            warn!("failed to save history to {}: {err}", self.path.display());
        }
    }
}

/// Line-at-a-time stdin for pipes and dumb terminals.
struct PlainStdin;

impl PlainStdin {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

fn readline_io_err(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(io_err) => io_err,
        other => io::Error::other(other),
    }
}
