//! Terminal host implementation using Reedline.
//!
//! This host provides interactive terminal I/O with:
//! - Readline-style line editing (Vi and Emacs modes)
//! - Tab completion of commands and field labels
//! - Syntax highlighting
//! - File-backed history, one entry per dispatched line or block

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditMode, Emacs, FileBackedHistory, HistoryItem, KeyCode,
    KeyModifiers, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu,
    Signal as ReedlineSignal, Vi,
};

use crate::completer::{LabelCache, ReplCompleter};
use crate::highlighter::{LineBuffer, ReplHighlighter};
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

/// Environment variable that forces the edit mode (`vi` or `emacs`).
pub const EDIT_MODE_VAR: &str = "LATTICE_EDIT_MODE";

const HISTORY_CAPACITY: usize = 1000;
const COMPLETION_MENU: &str = "completion_menu";

/// Terminal host using Reedline for interactive I/O.
pub struct TerminalHost {
    line_editor: Reedline,
    labels: LabelCache,
    drawn: LineBuffer,
    pending_input: Option<InputLine>,
    pending_signal: Option<Signal>,
    current_prompt: PromptConfig,
}

impl TerminalHost {
    /// Create a terminal host whose line history lives at `history_path`.
    ///
    /// `labels` is shared with the completer and refreshed from every
    /// prompt configuration the core sends.
    pub fn new(history_path: &Path, labels: LabelCache) -> io::Result<Self> {
        let completer = Box::new(ReplCompleter::new(LabelCache::clone(&labels)));
        let drawn = LineBuffer::default();
        let highlighter = Box::new(ReplHighlighter::new(LineBuffer::clone(&drawn)));
        let hinter = Box::new(
            DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
        );

        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name(COMPLETION_MENU)
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );

        let tab = ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]);
        let edit_mode: Box<dyn EditMode> = if should_use_vi_mode() {
            let mut insert_keybindings = default_vi_insert_keybindings();
            insert_keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab);
            Box::new(Vi::new(insert_keybindings, default_vi_normal_keybindings()))
        } else {
            let mut keybindings = default_emacs_keybindings();
            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab);
            Box::new(Emacs::new(keybindings))
        };

        if let Some(parent) = history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let history = FileBackedHistory::with_file(HISTORY_CAPACITY, history_path.to_path_buf())
            .map_err(|e| io::Error::other(e.to_string()))?;
        debug!("line history at {}", history_path.display());

        // Lines are saved by `record_history` once dispatched, so the editor
        // must not save them itself. Every line starts with "".
        let line_editor = Reedline::create()
            .with_history(Box::new(history))
            .with_history_exclusion_prefix(Some(String::new()))
            .with_completer(completer)
            .with_highlighter(highlighter)
            .with_hinter(hinter)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        Ok(Self {
            line_editor,
            labels,
            drawn,
            pending_input: None,
            pending_signal: None,
            current_prompt: PromptConfig::default(),
        })
    }
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt::from_config(&self.current_prompt);
        forget_drawn(&self.drawn);

        match self.line_editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => {
                self.pending_input = Some(InputLine { line });
            }
            Ok(ReedlineSignal::CtrlC) => {
                self.pending_signal = Some(interrupt(&self.drawn));
            }
            Ok(ReedlineSignal::CtrlD) => {
                self.pending_signal = Some(Signal::Eof);
            }
            Err(e) => {
                return Err(IoError::Io(format!("Reedline error: {}", e)));
            }
        }

        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.pending_input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.pending_signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let styled = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => {
                format!("{} {}", Color::Red.bold().paint("Error:"), output.text)
            }
            OutputStyle::Info => Color::Cyan.paint(&output.text).to_string(),
            OutputStyle::Banner => Color::Cyan.bold().paint(&output.text).to_string(),
        };
        println!("{}", styled);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        match self.labels.lock() {
            Ok(mut labels) => labels.clone_from(&config.labels),
            Err(_) => warn!("completion cache is poisoned; labels not refreshed"),
        }
        self.current_prompt = config;
        Ok(())
    }

    fn record_history(&mut self, entry: &str) -> Result<(), IoError> {
        let history = self.line_editor.history_mut();
        history
            .save(HistoryItem::from_command_line(entry))
            .map_err(|e| IoError::Io(format!("cannot save history: {}", e)))?;
        history
            .sync()
            .map_err(|e| IoError::Io(format!("cannot save history: {}", e)))
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush().map_err(|e| IoError::Io(e.to_string()))
    }
}

/// Prompt implementation for the terminal.
struct TerminalPrompt {
    module: Option<String>,
    continuation: bool,
}

impl TerminalPrompt {
    fn from_config(config: &PromptConfig) -> Self {
        Self {
            module: config.module.clone(),
            continuation: config.continuation,
        }
    }
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match &self.module {
            Some(module) => Cow::Owned(Color::Blue.bold().paint(module).to_string()),
            None => Cow::Borrowed(""),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        if self.continuation {
            return Cow::Owned(format!("{} ", Color::DarkGray.paint("...")));
        }
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => {
                Cow::Owned(format!("{} ", Color::Green.bold().paint(">")))
            }
            PromptEditMode::Vi(vi_mode) => {
                let indicator = match vi_mode {
                    PromptViMode::Normal => Color::Blue.bold().paint("[N]>"),
                    PromptViMode::Insert => Color::Green.bold().paint("[I]>"),
                };
                Cow::Owned(format!("{} ", indicator))
            }
            PromptEditMode::Custom(s) => Cow::Owned(format!("({})> ", s)),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn forget_drawn(drawn: &LineBuffer) {
    if let Ok(mut line) = drawn.lock() {
        line.clear();
    }
}

/// Ctrl+C drops a line that had content, and ends the session otherwise.
fn interrupt(drawn: &LineBuffer) -> Signal {
    let partial = drawn
        .lock()
        .map(|line| !line.trim().is_empty())
        .unwrap_or(false);
    Signal::Interrupt { partial }
}

/// Decide between vi and emacs editing.
///
/// An explicit `LATTICE_EDIT_MODE` wins; otherwise vi is chosen when the
/// user's editor is a vi, or their inputrc asks for it.
fn should_use_vi_mode() -> bool {
    if let Ok(mode) = std::env::var(EDIT_MODE_VAR) {
        return is_vi(&mode);
    }

    let editor_is_vi = ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| is_vi(&editor));

    editor_is_vi || check_inputrc_vi_mode()
}

fn is_vi(name: &str) -> bool {
    let name = name.to_lowercase();
    let base = name.rsplit('/').next().unwrap_or(&name);
    matches!(base, "vi" | "vim" | "nvim")
}

/// Check .inputrc for vi mode setting.
fn check_inputrc_vi_mode() -> bool {
    let inputrc_paths = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    inputrc_paths
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| content.lines().any(inputrc_selects_vi))
}

fn inputrc_selects_vi(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    matches!(words.as_slice(), ["set", "editing-mode", "vi", ..])
}
