//! Command grammar for the free-form word command line
//!
//! ```text
//! command   := "list" list_rest | "move" "tasks" "from" move_rest
//! list_rest := "tasks" | "all" "tasks" | "tasklists" | "tasks" "in" name
//! move_rest := name "to" name
//! name      := word+
//! ```
//!
//! Names are rejoined with single spaces. In `move_rest` the first bare `to`
//! token is the separator, so a source name containing the word `to` cannot be
//! expressed.

use std::fmt;

use crate::domain::DomainError;

/// Word that separates source and destination in a move command.
pub const MOVE_SEPARATOR: &str = "to";

/// Minimum word count of `move tasks from <A> to <B>`.
const MOVE_MIN_ARGS: usize = 6;

/// Minimum word count of `list tasks in <name>`.
const LIST_IN_MIN_ARGS: usize = 4;

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `list tasks`: tasks of the default list
    ListDefaultTasks,
    /// `list all tasks`: tasks of every list
    ListAllTasks,
    /// `list tasklists`
    ListAllTasklists,
    /// `list tasks in <name>`
    ListTasksInNamedList { name: String },
    /// `move tasks from <from_name> to <to_name>`
    MoveTasks { from_name: String, to_name: String },
}

impl Command {
    /// Parse the process arguments (program name excluded) into a command.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, DomainError> {
        let words: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let input = words.join(" ");

        match input.as_str() {
            "list tasks" => return Ok(Command::ListDefaultTasks),
            "list all tasks" => return Ok(Command::ListAllTasks),
            "list tasklists" => return Ok(Command::ListAllTasklists),
            _ => {}
        }

        match words.as_slice() {
            ["list", "tasks", "in", name @ ..] if words.len() >= LIST_IN_MIN_ARGS => {
                Ok(Command::ListTasksInNamedList {
                    name: name.join(" "),
                })
            }
            ["move", "tasks", "from", rest @ ..] => parse_move(rest, words.len(), &input),
            _ => Err(DomainError::UnrecognizedCommand { input }),
        }
    }
}

fn parse_move(rest: &[&str], arg_count: usize, input: &str) -> Result<Command, DomainError> {
    let malformed = |reason: &str| DomainError::MalformedMove {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if arg_count < MOVE_MIN_ARGS {
        return Err(malformed("expected 'move tasks from <source> to <destination>'"));
    }

    let separator = rest
        .iter()
        .position(|w| *w == MOVE_SEPARATOR)
        .ok_or_else(|| malformed("missing 'to' between source and destination"))?;

    let (from, to) = (&rest[..separator], &rest[separator + 1..]);
    if from.is_empty() {
        return Err(malformed("source list name is empty"));
    }
    if to.is_empty() {
        return Err(malformed("destination list name is empty"));
    }

    Ok(Command::MoveTasks {
        from_name: from.join(" "),
        to_name: to.join(" "),
    })
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ListDefaultTasks => write!(f, "list tasks"),
            Command::ListAllTasks => write!(f, "list all tasks"),
            Command::ListAllTasklists => write!(f, "list tasklists"),
            Command::ListTasksInNamedList { name } => write!(f, "list tasks in {name}"),
            Command::MoveTasks { from_name, to_name } => {
                write!(f, "move tasks from {from_name} to {to_name}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_name_with_inner_whitespace_when_parsing_then_rejoins_single_spaced() {
        let cmd = Command::parse(&["list", "tasks", "in", "Work", "Q4"]).unwrap();
        assert_eq!(
            cmd,
            Command::ListTasksInNamedList {
                name: "Work Q4".into()
            }
        );
    }

    #[test]
    fn given_parsed_command_when_displayed_then_round_trips_through_parser() {
        let cmd = Command::MoveTasks {
            from_name: "A list".into(),
            to_name: "B list".into(),
        };
        let words: Vec<String> = cmd.to_string().split(' ').map(String::from).collect();
        assert_eq!(Command::parse(&words).unwrap(), cmd);
    }

    #[test]
    fn given_empty_args_when_parsing_then_unrecognized() {
        let args: [&str; 0] = [];
        assert_eq!(
            Command::parse(&args),
            Err(DomainError::UnrecognizedCommand {
                input: String::new()
            })
        );
    }
}
