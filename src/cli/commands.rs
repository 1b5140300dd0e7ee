//! Command dispatcher
//!
//! Parses the command words, bootstraps the services and routes the command
//! to the matching operation.

use tracing::{debug, instrument};

use crate::cli::args::Cli;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::{Command, Task};
use crate::infrastructure::di::ServiceContainer;

/// Run the command given on the command line.
///
/// The words are parsed before settings or credentials are touched, so an
/// unrecognized command never triggers an authorization.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if cli.config_template {
        print!("{}", Settings::template());
        return Ok(());
    }
    if cli.show_config {
        let settings = Settings::load(cli.config.as_deref())?;
        print!("{}", settings.to_toml()?);
        return Ok(());
    }
    if cli.words.is_empty() {
        return Err(CliError::Usage(
            "no command given, see 'gtask --help'".to_string(),
        ));
    }
    let command = Command::parse(&cli.words)?;
    debug!("command: {}", command);

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings)?;
    dispatch(&command, &container)
}

/// Route a parsed command to its operation and print the result.
#[instrument(skip_all, fields(command = %command))]
pub fn dispatch(command: &Command, container: &ServiceContainer) -> CliResult<()> {
    let lists = container.task_list_service();
    match command {
        Command::ListDefaultTasks => {
            let name = &container.settings.default_list_name;
            print_tasks(name, &lists.default_list_tasks()?);
        }
        Command::ListAllTasks => {
            for (list, tasks) in lists.all_tasks()? {
                print_tasks(&list.title, &tasks);
            }
        }
        Command::ListAllTasklists => {
            let all = lists.tasklists()?;
            output::header("Task Lists:");
            for list in &all {
                output::item(&list.title);
            }
        }
        Command::ListTasksInNamedList { name } => {
            print_tasks(name, &lists.tasks_in_named(name)?);
        }
        Command::MoveTasks { from_name, to_name } => {
            container.ensure_write_access()?;
            let report = container.move_service().move_named(from_name, to_name)?;
            if report.moved.is_empty() {
                output::warning(&format!("'{from_name}' has no tasks, nothing moved"));
            } else {
                output::success(&format!(
                    "Moved {} task(s) from '{}' to '{}'",
                    report.count(),
                    from_name,
                    to_name
                ));
            }
        }
    }
    Ok(())
}

fn print_tasks(list_name: &str, tasks: &[Task]) {
    output::header(&format!("Tasks in {list_name}:"));
    for task in tasks {
        output::item(&task.title);
    }
}
