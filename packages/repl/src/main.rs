use clap::{ArgAction, Args, Parser, Subcommand};

use lattice_repl::host::terminal::EDIT_MODE_VAR;

/// Lattice - tools for the Lattice configuration language
#[derive(Parser, Debug)]
#[command(name = "lattice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive session
    Repl(ReplArgs),
}

#[derive(Args, Debug)]
struct ReplArgs {
    /// Load the project rooted at the working directory
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    discover: bool,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,
}

fn main() {
    env_logger::init();

    let Commands::Repl(args) = Cli::parse().command;

    // Set edit mode override if specified
    if args.vi {
        std::env::set_var(EDIT_MODE_VAR, "vi");
    } else if args.emacs {
        std::env::set_var(EDIT_MODE_VAR, "emacs");
    }

    if let Err(e) = lattice_repl::run(args.discover) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
