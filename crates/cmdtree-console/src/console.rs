//! The line-oriented console loop.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cmdtree::{Dispatcher, Extensions, ManifestError};
use tracing::{debug, info, warn};

use crate::handlers::{self, HelpIndex, Roster};
use crate::output::{write_outcome, OutputMode};

/// Command file used when none is given on the command line.
pub const DEFAULT_COMMANDS: &str = include_str!("../commands.yaml");

/// Suffix that turns a line into a completion request.
const COMPLETE_SUFFIX: char = '?';

pub struct Console {
    dispatcher: Dispatcher,
    mode: OutputMode,
}

impl Console {
    /// Builds a console from a YAML command file.
    pub fn new(commands: &str, mode: OutputMode) -> Result<Self, ManifestError> {
        let mut dispatcher = Dispatcher::with_providers(handlers::providers());
        let count = dispatcher.load_yaml(commands, &handlers::registry())?;
        info!(count, "commands loaded");

        let mut app_state = Extensions::new();
        app_state.insert(HelpIndex(dispatcher.help_lines()));
        app_state.insert(Roster::default());

        let mut dispatcher = dispatcher.with_app_state(app_state);
        dispatcher.exception_handler(|err, inv| {
            warn!(line = inv.line(), error = %err, "command failed");
            Err(err)
        });
        Ok(Self { dispatcher, mode })
    }

    /// Builds a console from the command file at `path`.
    pub fn from_file(path: &Path, mode: OutputMode) -> Result<Self> {
        let commands = fs::read_to_string(path)
            .with_context(|| format!("could not read command file {}", path.display()))?;
        Self::new(&commands, mode)
            .with_context(|| format!("could not load command file {}", path.display()))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Executes one line and writes its outcome.
    pub fn execute<W: Write>(&self, line: &str, out: &mut W) -> Result<()> {
        let outcome = self.dispatcher.execute(line)?;
        write_outcome(out, &outcome, self.mode)?;
        Ok(())
    }

    pub fn complete(&self, line: &str) -> Vec<String> {
        self.dispatcher.get_suggestions(line)
    }

    /// Writes the completions of `line`, one per line.
    pub fn write_completions<W: Write>(&self, line: &str, out: &mut W) -> Result<()> {
        for suggestion in self.complete(line) {
            writeln!(out, "{}", suggestion)?;
        }
        Ok(())
    }

    /// Reads lines until end of input.
    ///
    /// A line ending in `?` prints the completions of the text before it.
    /// Failed commands print an error and the loop continues.
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W, prompt: bool) -> Result<()> {
        if prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        for line in input.lines() {
            let line = line.context("could not read input")?;
            let trimmed = line.trim_start();

            if let Some(partial) = trimmed.strip_suffix(COMPLETE_SUFFIX) {
                debug!(line = partial, "completing");
                self.write_completions(partial, out)?;
            } else if !trimmed.trim_end().is_empty() {
                if let Err(err) = self.execute(trimmed, out) {
                    writeln!(out, "error: {:#}", err)?;
                }
            }

            if prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(mode: OutputMode) -> Console {
        Console::new(DEFAULT_COMMANDS, mode).unwrap()
    }

    fn execute(console: &Console, line: &str) -> String {
        let mut out = Vec::new();
        console.execute(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn default_commands_load() {
        let console = console(OutputMode::Text);
        assert!(console.dispatcher().get_command("time query").is_some());
        assert!(console.dispatcher().get_command("warp").is_some());
    }

    #[test]
    fn builtin_commands() {
        let console = console(OutputMode::Text);
        assert_eq!(execute(&console, "echo hello   world"), "hello world\n");
        assert_eq!(execute(&console, "say"), "");
        assert_eq!(execute(&console, "sum 1 2 3.5"), "count: 3\ntotal: 6.5\n");
        assert_eq!(execute(&console, "give alex diamond 3"), "Gave 3 diamond to alex\n");
        assert_eq!(execute(&console, "g -s sam stick"), "");
        assert_eq!(execute(&console, "time set night"), "Set the time to 13000\n");
        assert_eq!(execute(&console, "time query"), "time: 13000\n");
        assert_eq!(
            execute(&console, "tp 1 64 -2 -p steve"),
            "player: steve\nx: 1.0\ny: 64.0\nz: -2.0\n"
        );
    }

    #[test]
    fn help_lists_and_filters() {
        let console = console(OutputMode::Text);
        let all = execute(&console, "help");
        assert!(all.lines().any(|line| line.starts_with("echo [text...]")));
        assert!(all.lines().any(|line| line.starts_with("time query")));

        let give = execute(&console, "h give");
        assert_eq!(give.lines().count(), 1);
        assert!(give.starts_with("give <player> <item> [amount] [-s]"));

        assert!(console.execute("help fly", &mut Vec::new()).is_err());
    }

    #[test]
    fn json_output() {
        let console = console(OutputMode::Json);
        assert_eq!(
            execute(&console, "sum 2 2"),
            "{\n  \"count\": 2,\n  \"total\": 4.0\n}\n"
        );
    }

    #[test]
    fn run_loop_reports_errors_and_completes() {
        let console = console(OutputMode::Text);
        let input = "echo one\n\ngive herobrine dirt\ntime s?\nfly\n";
        let mut out = Vec::new();
        console.run(input.as_bytes(), &mut out, false).unwrap();

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "one");
        assert!(lines[1].starts_with("error: invalid player 'herobrine'"));
        assert_eq!(lines[2], "set");
        assert_eq!(lines[3], "error: unknown command 'fly'");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn completions() {
        let console = console(OutputMode::Text);
        assert_eq!(console.complete("ti"), vec!["time"]);
        assert_eq!(console.complete("give a"), vec!["alex"]);
        assert_eq!(console.complete("time set n"), vec!["night", "noon"]);
    }

    #[test]
    fn completes_teleport_position_axis_by_axis() {
        let console = console(OutputMode::Text);
        assert_eq!(console.complete("tp 1 "), vec!["~"]);
        assert_eq!(console.complete("tp 1 64 "), vec!["~"]);
        assert_eq!(console.complete("tp 1 64 ~ "), vec!["--player", "-p"]);
        assert_eq!(console.complete("tp 1 64 ~ -p s"), vec!["steve", "sam"]);
        assert_eq!(execute(&console, "tp ~ 70 ~2"), "x: ~\ny: 70.0\nz: ~2\n");
    }
}
