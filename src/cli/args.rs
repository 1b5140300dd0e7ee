//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

const COMMANDS_HELP: &str = "\
COMMANDS:
  list tasklists                    Show all task lists
  list tasks                        Show tasks of the default list
  list tasks in <NAME>              Show tasks of the named list
  list all tasks                    Show tasks of every list
  move tasks from <FROM> to <TO>    Move every task of FROM into TO

List names may contain spaces. In a move, the first standalone word 'to'
separates the two names.";

/// Manage Google Tasks lists from the command line
#[derive(Parser, Debug)]
#[command(name = "gtask")]
#[command(author, version, about, long_about = None)]
#[command(after_help = COMMANDS_HELP)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: $XDG_CONFIG_HOME/gtask/gtask.toml)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completion: Option<clap_complete::Shell>,

    /// Print the effective configuration as TOML and exit
    #[arg(long, conflicts_with_all = ["words", "config_template"])]
    pub show_config: bool,

    /// Print a commented config file template and exit
    #[arg(long, conflicts_with = "words")]
    pub config_template: bool,

    /// Command words, e.g. `list tasks in Groceries`
    #[arg(value_name = "WORDS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}
