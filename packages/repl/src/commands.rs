//! Meta-command parsing and execution.
//!
//! Commands start with `:` and take whitespace-separated arguments.
//! [`COMMANDS`] is the one list of them: parsing, `:help`, completion and
//! highlighting all read it.

use std::path::PathBuf;

use nu_ansi_term::{Color, Style};

use crate::error::ReplError;
use crate::presentation;
use crate::session::Session;

/// Prefix that marks a line as a command.
pub const PREFIX: char = ':';

const COMMAND_USAGE: &str = ":<command> [arguments] (type :help for a list of commands)";

type ParseArgs = fn(&[&str], &'static str) -> Result<Command, ReplError>;

/// A command as the user sees it.
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// The command line as shown in help and usage errors.
    pub usage: &'static str,
    pub summary: &'static str,
    parse: ParseArgs,
}

/// Every command, in the order `:help` lists them.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "print",
        aliases: &["p"],
        usage: ":print",
        summary: "Print the current value",
        parse: |args, usage| no_args(args, usage).map(|()| Command::Print),
    },
    CommandSpec {
        name: "lookup",
        aliases: &["l"],
        usage: ":lookup <path>",
        summary: "Print the value at a dotted path",
        parse: |args, usage| Ok(Command::Lookup(one_arg(args, usage)?.to_string())),
    },
    CommandSpec {
        name: "inject",
        aliases: &["i"],
        usage: ":inject <file>",
        summary: "Load a file or directory into the program",
        parse: |args, usage| Ok(Command::Inject(PathBuf::from(one_arg(args, usage)?))),
    },
    CommandSpec {
        name: "save",
        aliases: &["s"],
        usage: ":save <path>",
        summary: "Move the latest value under <path>",
        parse: |args, usage| Ok(Command::Save(one_arg(args, usage)?.to_string())),
    },
    CommandSpec {
        name: "restore",
        aliases: &["r"],
        usage: ":restore <index>",
        summary: "Replace the program with a history entry",
        parse: |args, usage| {
            let index = one_arg(args, usage)?;
            let index = index.parse().map_err(|_| ReplError::Usage { usage })?;
            Ok(Command::Restore(index))
        },
    },
    CommandSpec {
        name: "history",
        aliases: &["h"],
        usage: ":history",
        summary: "Print the history",
        parse: |args, usage| no_args(args, usage).map(|()| Command::History),
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        usage: ":help",
        summary: "Show this help message",
        parse: |args, usage| no_args(args, usage).map(|()| Command::Help),
    },
    CommandSpec {
        name: "exit",
        aliases: &["quit", "q"],
        usage: ":exit",
        summary: "Leave the session",
        parse: |args, usage| no_args(args, usage).map(|()| Command::Exit),
    },
];

/// The command called `word` by name or alias, ignoring case.
pub fn find_command(word: &str) -> Option<&'static CommandSpec> {
    let word = word.to_lowercase();
    COMMANDS
        .iter()
        .find(|spec| spec.name == word || spec.aliases.contains(&word.as_str()))
}

/// Every name and alias, names first.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS
        .iter()
        .map(|spec| spec.name)
        .chain(COMMANDS.iter().flat_map(|spec| spec.aliases.iter().copied()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Print,
    Lookup(String),
    Inject(PathBuf),
    Save(String),
    Restore(i64),
    History,
    Exit,
    Unknown(String),
}

impl Command {
    /// Parse the text after the `:` prefix.
    ///
    /// Wrong argument counts are usage errors; an unrecognized command word
    /// parses to [`Command::Unknown`].
    pub fn parse(text: &str) -> Result<Command, ReplError> {
        let mut words = text.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ReplError::Usage {
                usage: COMMAND_USAGE,
            });
        };
        let args: Vec<&str> = words.collect();

        match find_command(name) {
            Some(spec) => (spec.parse)(&args, spec.usage),
            None => Ok(Command::Unknown(name.to_string())),
        }
    }
}

fn no_args(args: &[&str], usage: &'static str) -> Result<(), ReplError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ReplError::Usage { usage })
    }
}

fn one_arg<'a>(args: &[&'a str], usage: &'static str) -> Result<&'a str, ReplError> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(ReplError::Usage { usage }),
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok { display: Option<String> },
    /// A status report that is not a value, such as a lookup miss
    Info(String),
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    pub fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    pub fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }
}

impl From<ReplError> for CommandResult {
    fn from(err: ReplError) -> Self {
        CommandResult::Error(err.to_string())
    }
}

/// Run `command` against the session.
pub fn execute(command: Command, session: &mut Session) -> CommandResult {
    let result = match command {
        Command::Help => return CommandResult::Help,
        Command::Exit => return CommandResult::Exit,
        Command::Unknown(name) => return ReplError::UnknownCommand(name).into(),
        Command::Print => cmd_print(session),
        Command::Lookup(path) => cmd_lookup(session, &path),
        Command::Inject(path) => cmd_inject(session, path),
        Command::Save(path) => cmd_save(session, &path),
        Command::Restore(index) => cmd_restore(session, index),
        Command::History => cmd_history(session),
    };
    result.unwrap_or_else(CommandResult::from)
}

fn cmd_print(session: &Session) -> Result<CommandResult, ReplError> {
    let text = presentation::render(&session.value()?)?;
    if text.is_empty() {
        return Ok(CommandResult::ok_none());
    }
    Ok(CommandResult::ok_display(text))
}

fn cmd_lookup(session: &Session, path: &str) -> Result<CommandResult, ReplError> {
    match session.lookup(path)? {
        Some(value) => Ok(CommandResult::ok_display(presentation::render(&value)?)),
        None => Ok(CommandResult::Info("no value".to_string())),
    }
}

fn cmd_inject(session: &mut Session, path: PathBuf) -> Result<CommandResult, ReplError> {
    let count = session.inject(&path)?;
    Ok(CommandResult::Info(format!(
        "injected {} file(s) from {}",
        count,
        path.display()
    )))
}

fn cmd_save(session: &mut Session, path: &str) -> Result<CommandResult, ReplError> {
    session.save(path)?;
    Ok(CommandResult::Info(format!("saved under {}", path)))
}

fn cmd_restore(session: &mut Session, index: i64) -> Result<CommandResult, ReplError> {
    session.restore(index)?;
    Ok(CommandResult::Info(format!("restored history entry {}", index)))
}

fn cmd_history(session: &Session) -> Result<CommandResult, ReplError> {
    let rule = Color::Blue.paint("====");
    let divider = Color::Blue.paint("----");
    let history = session.history();

    let mut output = format!("{}\n", rule);
    for (i, value) in history.iter().enumerate() {
        output.push_str(&format!("{}\n", Color::Blue.paint(i.to_string())));
        let text = presentation::render(value)?;
        if !text.is_empty() {
            output.push_str(&text);
            output.push('\n');
        }
        if i + 1 != history.len() {
            output.push_str(&format!("{}\n", divider));
        }
    }
    output.push_str(&rule.to_string());
    Ok(CommandResult::ok_display(output))
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);
    let desc_style = Style::new().fg(Color::White);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("Lattice REPL Commands")
    ));

    for spec in COMMANDS {
        let (cmd, args) = spec.usage.split_once(' ').unwrap_or((spec.usage, ""));
        let aliases: Vec<String> = spec
            .aliases
            .iter()
            .map(|alias| format!("{}{}", PREFIX, alias))
            .collect();
        let desc = format!("{} (alias: {})", spec.summary, aliases.join(", "));
        help.push_str(&format!(
            "  {:<12} {:<10} {}\n",
            cmd_style.paint(cmd),
            arg_style.paint(args),
            desc_style.paint(desc)
        ));
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Input")));
    help.push_str(&format!(
        "  Add a declaration:        {}\n",
        arg_style.paint("a: 1")
    ));
    help.push_str(&format!(
        "  Add anything explicitly:  {}\n",
        arg_style.paint("= #T: {name: string}")
    ));
    help.push_str(&format!(
        "  Evaluate an expression:   {}\n",
        arg_style.paint("a + 1")
    ));
    help.push_str(&format!(
        "  Multi-line block:         {}\n",
        arg_style.paint("\"\"\"  ...lines...  \"\"\"")
    ));

    help.push_str(&format!(
        "\n{}",
        Style::new()
            .italic()
            .paint("Ctrl+C clears the line, or exits on an empty line. Ctrl+D exits.")
    ));

    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_lang::Value;

    fn usage(text: &str) -> &'static str {
        match Command::parse(text) {
            Err(ReplError::Usage { usage }) => usage,
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    #[test]
    fn parse_long_and_short_aliases() {
        assert_eq!(Command::parse("print").unwrap(), Command::Print);
        assert_eq!(Command::parse("p").unwrap(), Command::Print);
        assert_eq!(
            Command::parse("lookup a.b").unwrap(),
            Command::Lookup("a.b".to_string())
        );
        assert_eq!(
            Command::parse("l a").unwrap(),
            Command::Lookup("a".to_string())
        );
        assert_eq!(
            Command::parse("i conf.lat").unwrap(),
            Command::Inject(PathBuf::from("conf.lat"))
        );
        assert_eq!(
            Command::parse("s x.y").unwrap(),
            Command::Save("x.y".to_string())
        );
        assert_eq!(Command::parse("r 2").unwrap(), Command::Restore(2));
        assert_eq!(Command::parse("r -1").unwrap(), Command::Restore(-1));
        assert_eq!(Command::parse("h").unwrap(), Command::History);
        assert_eq!(Command::parse("?").unwrap(), Command::Help);
        assert_eq!(Command::parse("q").unwrap(), Command::Exit);
        assert_eq!(Command::parse("  PRINT  ").unwrap(), Command::Print);
    }

    #[test]
    fn parse_argument_counts() {
        assert_eq!(usage("print extra"), ":print");
        assert_eq!(usage("lookup"), ":lookup <path>");
        assert_eq!(usage("lookup a b"), ":lookup <path>");
        assert_eq!(usage("restore"), ":restore <index>");
        assert_eq!(usage("restore one"), ":restore <index>");
        assert_eq!(usage("history 1"), ":history");
        assert_eq!(usage("q now"), ":exit");
        assert_eq!(usage(""), COMMAND_USAGE);
    }

    #[test]
    fn every_name_and_alias_resolves_to_its_own_command() {
        let mut seen = std::collections::HashSet::new();
        for spec in COMMANDS {
            for word in std::iter::once(spec.name).chain(spec.aliases.iter().copied()) {
                assert!(seen.insert(word), "{} is listed twice", word);
                assert_eq!(find_command(word).map(|s| s.name), Some(spec.name));
                assert_eq!(
                    find_command(&word.to_uppercase()).map(|s| s.name),
                    Some(spec.name)
                );
            }
        }
        assert_eq!(command_names().count(), seen.len());
        assert!(find_command("frob").is_none());
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            Command::parse("frobnicate x").unwrap(),
            Command::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut session = Session::new();
        let result = execute(Command::Unknown("zap".to_string()), &mut session);
        match result {
            CommandResult::Error(msg) => assert!(msg.contains("unknown command \"zap\"")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn print_and_lookup() {
        let mut session = Session::new();
        session.add_statement("a: 1").unwrap();
        assert_eq!(
            execute(Command::Print, &mut session),
            CommandResult::ok_display("a: 1")
        );
        assert_eq!(
            execute(Command::Lookup("a".to_string()), &mut session),
            CommandResult::ok_display("1")
        );
        assert_eq!(
            execute(Command::Lookup("b".to_string()), &mut session),
            CommandResult::Info("no value".to_string())
        );
    }

    #[test]
    fn print_of_empty_program_shows_nothing() {
        let mut session = Session::new();
        assert_eq!(execute(Command::Print, &mut session), CommandResult::ok_none());
    }

    #[test]
    fn history_lists_every_entry() {
        let mut session = Session::new();
        session.add_statement("a: 1").unwrap();
        let CommandResult::Ok {
            display: Some(text),
        } = execute(Command::History, &mut session)
        else {
            panic!("history should display");
        };
        assert!(text.contains("0"));
        assert!(text.contains("1"));
        assert!(text.contains("a: 1"));
        assert_eq!(text.matches("----").count(), 1);
        assert_eq!(text.matches("====").count(), 2);
    }

    #[test]
    fn restore_out_of_range_reports_error() {
        let mut session = Session::new();
        match execute(Command::Restore(3), &mut session) {
            CommandResult::Error(msg) => assert!(msg.contains("out of range")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn save_then_restore() {
        let mut session = Session::new();
        session.add_statement("a: 1").unwrap();
        assert!(matches!(
            execute(Command::Save("cfg".to_string()), &mut session),
            CommandResult::Info(_)
        ));
        assert_eq!(session.lookup("cfg.a").unwrap(), Some(Value::Int(1)));

        execute(Command::Restore(1), &mut session);
        assert_eq!(session.lookup("a").unwrap(), Some(Value::Int(1)));
        assert_eq!(session.lookup("cfg").unwrap(), None);
    }

    #[test]
    fn help_lists_commands() {
        let help = format_help();
        for spec in COMMANDS {
            assert!(help.contains(spec.usage.split(' ').next().unwrap()));
            assert!(help.contains(spec.summary), "help is missing {}", spec.name);
        }
        assert!(help.contains(":quit, :q"));
    }
}
