//! Interactive REPL (Read-Eval-Print Loop) for stagecraft.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;

use super::action::Action;
use super::api::{Session, SessionError};
use crate::storage::{CommitId, FileEntry, FileId, Modification, Repository, StorageError};

/// REPL errors.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("unknown command: {0} (type .help for available commands)")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    MissingArgument(&'static str),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for REPL operations.
pub type ReplResult<T> = Result<T, ReplError>;

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { name: Option<String> },
    /// `None` draws a random modification
    Modify { file: String, change: Option<Modification> },
    Delete { file: String },
    Stage { file: String },
    StageAll,
    Unstage { file: String },
    Commit,
    Revert { commit: String },
    Status,
    Log,
    Help,
    Console,
    Journal,
    Stats,
    Json,
    Reset,
    Quit,
}

impl Command {
    /// Whether the command changes the repository.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Modify { .. }
                | Command::Delete { .. }
                | Command::Stage { .. }
                | Command::StageAll
                | Command::Unstage { .. }
                | Command::Commit
                | Command::Revert { .. }
                | Command::Reset
        )
    }
}

/// Parse one line. Empty lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> ReplResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let arg = |usage: &'static str| -> ReplResult<String> {
        parts
            .get(1)
            .map(|s| s.to_string())
            .ok_or(ReplError::MissingArgument(usage))
    };

    let command = match parts[0].to_lowercase().as_str() {
        "add" | "touch" => Command::Add {
            name: parts.get(1).map(|s| s.to_string()),
        },
        "modify" | "edit" => {
            let file = arg("modify <file> [<insertions> [<deletions>]]")?;
            let change = match parts.get(2) {
                Some(ins) => {
                    let insertions = parse_count(ins.strip_prefix('+').unwrap_or(*ins))?;
                    let deletions = match parts.get(3) {
                        Some(del) => parse_count(del.strip_prefix('-').unwrap_or(*del))?,
                        None => 0,
                    };
                    Some(Modification::new(insertions, deletions))
                }
                None => None,
            };
            Command::Modify { file, change }
        }
        "delete" | "rm" => Command::Delete {
            file: arg("delete <file>")?,
        },
        "stage" => match parts.get(1) {
            Some(&".") | Some(&"-a") | Some(&"--all") => Command::StageAll,
            _ => Command::Stage {
                file: arg("stage <file>")?,
            },
        },
        "stage-all" => Command::StageAll,
        "unstage" | "restore" => Command::Unstage {
            file: arg("unstage <file>")?,
        },
        "commit" => Command::Commit,
        "revert" | "checkout" => Command::Revert {
            commit: arg("revert <checksum | HEAD~n>")?,
        },
        "status" | "st" => Command::Status,
        "log" => Command::Log,
        ".help" | ".h" | ".?" | "help" => Command::Help,
        ".console" => Command::Console,
        ".journal" => Command::Journal,
        ".stats" => Command::Stats,
        ".json" => Command::Json,
        ".reset" => Command::Reset,
        ".quit" | ".exit" | ".q" | "quit" | "exit" => Command::Quit,
        other => return Err(ReplError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// line counts typed at the prompt are never negative
fn parse_count(s: &str) -> ReplResult<i32> {
    match s.parse::<i32>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ReplError::InvalidNumber(s.to_string())),
    }
}

/// Resolve a commit reference: `HEAD`, `HEAD~n` or a checksum prefix.
pub fn resolve_commit(repo: &Repository, reference: &str) -> Result<CommitId, StorageError> {
    let upper = reference.to_uppercase();
    if let Some(rest) = upper.strip_prefix("HEAD") {
        let steps = match rest.strip_prefix('~') {
            Some("") => 1,
            Some(n) => n
                .parse::<usize>()
                .map_err(|_| StorageError::CommitNotFound(reference.to_string()))?,
            None if rest.is_empty() => 0,
            None => return repo.find_commit(reference),
        };
        return repo
            .history()
            .nth(steps)
            .map(|c| c.id())
            .ok_or_else(|| StorageError::CommitNotFound(reference.to_string()));
    }
    repo.find_commit(reference)
}

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Print the working directory and staging area after every change.
    pub show_status_after_command: bool,
    /// Print the banner on start.
    pub banner: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "stagecraft> ".into(),
            show_status_after_command: false,
            banner: true,
        }
    }
}

/// The interactive REPL.
pub struct Repl {
    session: Session,
    config: ReplConfig,
    history: Vec<String>,
}

impl Repl {
    /// Create a new REPL over the given session.
    pub fn new(session: Session) -> Self {
        Self::with_config(session, ReplConfig::default())
    }

    /// Create a REPL with custom configuration.
    pub fn with_config(session: Session, config: ReplConfig) -> Self {
        Self {
            session,
            config,
            history: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Lines entered so far.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Run the REPL on stdin/stdout.
    pub fn run(&mut self) -> ReplResult<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.run_with(stdin.lock(), &mut stdout, true)
    }

    /// Run the REPL over any input, writing output and errors to `out`.
    pub fn run_with<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
        interactive: bool,
    ) -> ReplResult<()> {
        if interactive && self.config.banner {
            print_banner(out)?;
        }

        loop {
            if interactive {
                write!(out, "{}", self.config.prompt)?;
                out.flush()?;
            }

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                if interactive {
                    writeln!(out, "\nGoodbye!")?;
                }
                break;
            }

            match self.execute_line(line.trim_end(), out) {
                Ok(true) => break,
                Ok(false) => {}
                Err(ReplError::Io(e)) => return Err(ReplError::Io(e)),
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }

        Ok(())
    }

    /// Run every line of a script file, stopping at the first error.
    pub fn run_script<W: Write>(&mut self, path: &Path, out: &mut W) -> ReplResult<()> {
        let script = fs::read_to_string(path)?;
        self.run_commands(script.lines(), out)
    }

    /// Run commands in order, stopping at the first error.
    pub fn run_commands<'a, I, W>(&mut self, commands: I, out: &mut W) -> ReplResult<()>
    where
        I: IntoIterator<Item = &'a str>,
        W: Write,
    {
        for command in commands {
            if self.execute_line(command, out)? {
                break;
            }
        }
        Ok(())
    }

    /// Execute one line. Returns `true` when the REPL should exit.
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> ReplResult<bool> {
        let command = match parse_command(line)? {
            Some(command) => command,
            None => return Ok(false),
        };
        self.history.push(line.trim().to_string());

        let mutation = command.is_mutation();
        if self.execute(command, out)? {
            return Ok(true);
        }
        if mutation && self.config.show_status_after_command {
            write_status(self.session.repository(), out)?;
        }
        Ok(false)
    }

    fn file(&self, reference: &str) -> ReplResult<FileId> {
        Ok(self.session.repository().find_file(reference)?)
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> ReplResult<bool> {
        let action = match command {
            Command::Add { name } => Action::AddFile { name },
            Command::Modify { file, change } => {
                let file = self.file(&file)?;
                match change {
                    Some(m) => Action::ModifyFile {
                        file,
                        insertions: m.insertions,
                        deletions: m.deletions,
                    },
                    None => self.session.random_modification(file),
                }
            }
            Command::Delete { file } => Action::DeleteFile {
                file: self.file(&file)?,
            },
            Command::Stage { file } => Action::StageFile {
                file: self.file(&file)?,
            },
            Command::StageAll => Action::StageAllFiles,
            Command::Unstage { file } => Action::UnstageFile {
                file: self.file(&file)?,
            },
            Command::Commit => Action::CreateCommit,
            Command::Revert { commit } => Action::RevertCommit {
                commit: resolve_commit(self.session.repository(), &commit)?,
            },
            Command::Status => {
                write_status(self.session.repository(), out)?;
                return Ok(false);
            }
            Command::Log => {
                write_log(self.session.repository(), out)?;
                return Ok(false);
            }
            Command::Help => {
                print_help(out)?;
                return Ok(false);
            }
            Command::Console => {
                for entry in self.session.console().entries() {
                    writeln!(out, "{}", entry)?;
                }
                return Ok(false);
            }
            Command::Journal => {
                for (i, action) in self.session.journal().iter().enumerate() {
                    writeln!(out, "  {}: {}", i + 1, action)?;
                }
                return Ok(false);
            }
            Command::Stats => {
                write!(out, "{}", self.session.repository().stats())?;
                writeln!(out)?;
                return Ok(false);
            }
            Command::Json => {
                let snapshot = self.session.snapshot()?;
                let json = serde_json::to_string_pretty(&snapshot)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                writeln!(out, "{}", json)?;
                return Ok(false);
            }
            Command::Reset => {
                self.session.reset();
                writeln!(out, "Session reset.")?;
                return Ok(false);
            }
            Command::Quit => return Ok(true),
        };

        self.session.dispatch(action)?;
        if let Some(entry) = self.session.console().last() {
            writeln!(out, "{}", entry.message)?;
        }
        Ok(false)
    }
}

fn print_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "╔═══════════════════════════════════════════════════╗")?;
    writeln!(out, "║                  stagecraft v0.1.0                ║")?;
    writeln!(out, "║     Working directory, staging area, commits      ║")?;
    writeln!(out, "╠═══════════════════════════════════════════════════╣")?;
    writeln!(out, "║         Type .help for available commands         ║")?;
    writeln!(out, "╚═══════════════════════════════════════════════════╝")?;
    writeln!(out)
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  add [name]                      Add a new file")?;
    writeln!(out, "  modify <file> [+ins [-del]]     Modify a file (random if no amount)")?;
    writeln!(out, "  delete <file>                   Delete a file")?;
    writeln!(out, "  stage <file>                    Add a file to the staging area")?;
    writeln!(out, "  stage-all                       Stage every changed file")?;
    writeln!(out, "  unstage <file>                  Remove a file from the staging area")?;
    writeln!(out, "  commit                          Commit the staging area")?;
    writeln!(out, "  revert <checksum | HEAD~n>      Restore the working directory to a commit")?;
    writeln!(out, "  status                          Show working directory and staging area")?;
    writeln!(out, "  log                             Show the commit history")?;
    writeln!(out)?;
    writeln!(out, "  .help, .h, .?                   Show this help message")?;
    writeln!(out, "  .console                        Show the console log")?;
    writeln!(out, "  .journal                        Show applied actions")?;
    writeln!(out, "  .stats                          Show repository statistics")?;
    writeln!(out, "  .json                           Print the full state as JSON")?;
    writeln!(out, "  .reset                          Start over")?;
    writeln!(out, "  .quit, .exit, .q                Exit the REPL")?;
    writeln!(out)?;
    writeln!(out, "Files are referenced by name (file1) or number (1, #1).")
}

fn write_entries<W: Write>(out: &mut W, entries: &[FileEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "  (empty)");
    }
    for entry in entries {
        writeln!(
            out,
            "  {} {:<12} {}",
            entry.status.marker(),
            entry.name,
            entry.stats
        )?;
    }
    Ok(())
}

/// Print the working directory and the staging area.
pub fn write_status<W: Write>(repo: &Repository, out: &mut W) -> ReplResult<()> {
    writeln!(out, "Working directory:")?;
    write_entries(out, &repo.working_directory_entries()?)?;
    writeln!(out, "Staging area:")?;
    write_entries(out, &repo.staging_area_entries()?)?;
    Ok(())
}

/// Print the commit history, newest first.
pub fn write_log<W: Write>(repo: &Repository, out: &mut W) -> ReplResult<()> {
    if repo.head().is_none() {
        writeln!(out, "(no commits)")?;
        return Ok(());
    }
    for commit in repo.history() {
        let summary = repo.commit_summary(commit.id())?;
        let head = if summary.is_head { " (HEAD)" } else { "" };
        writeln!(
            out,
            "* {}{} {}",
            summary.checksum,
            head,
            summary.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        write_entries(out, &summary.files)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::api::SessionConfig;
    use crate::storage::ChangeStatus;
    use std::io::Cursor;

    fn repl() -> Repl {
        let session = Session::with_config(SessionConfig::new().seed(7)).unwrap();
        Repl::new(session)
    }

    fn run(repl: &mut Repl, line: &str) -> String {
        let mut out = Vec::new();
        repl.execute_line(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("# comment").unwrap(), None);
        assert_eq!(parse_command("add").unwrap(), Some(Command::Add { name: None }));
        assert_eq!(
            parse_command("modify file1 +3 -1").unwrap(),
            Some(Command::Modify {
                file: "file1".into(),
                change: Some(Modification::new(3, 1)),
            })
        );
        assert_eq!(
            parse_command("modify 2").unwrap(),
            Some(Command::Modify {
                file: "2".into(),
                change: None,
            })
        );
        assert_eq!(parse_command("stage .").unwrap(), Some(Command::StageAll));
        assert_eq!(parse_command(".q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_command("frobnicate"),
            Err(ReplError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse_command("stage"),
            Err(ReplError::MissingArgument(_))
        ));
        assert!(matches!(
            parse_command("modify file1 lots"),
            Err(ReplError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_command("modify file1 -3"),
            Err(ReplError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_command("modify file1 +3 --1"),
            Err(ReplError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_round_trip_through_commands() {
        let mut repl = repl();
        assert_eq!(run(&mut repl, "add"), "A new file file1 was added.\n");
        assert_eq!(
            run(&mut repl, "stage file1"),
            "File file1 was added to the staging area.\n"
        );
        assert!(run(&mut repl, "commit").starts_with("New commit "));
        assert_eq!(
            run(&mut repl, "modify 1 +4 -2"),
            "File file1 was modified (+4 -2).\n"
        );

        let status = run(&mut repl, "status");
        assert!(status.contains("M file1"));
        assert!(status.contains("+4 -2"));

        run(&mut repl, "revert HEAD");
        let repo = repl.session().repository();
        let file = repo.find_file("file1").unwrap();
        assert_eq!(repo.working_status(file), ChangeStatus::Unmodified);
    }

    #[test]
    fn test_errors_are_printed_and_loop_continues() {
        let mut repl = repl();
        let input = Cursor::new("add\nstage 1\nstage 1\nunstage 9\n.journal\n");
        let mut out = Vec::new();
        repl.run_with(input, &mut out, false).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Error: file #1 is already staged"));
        assert!(out.contains("Error: no file named 9"));
        assert!(out.contains("2: STAGE_FILE #1"));
        assert_eq!(repl.session().journal().len(), 2);
    }

    #[test]
    fn test_quit_stops_reading() {
        let mut repl = repl();
        let input = Cursor::new("add\n.quit\nadd\n");
        let mut out = Vec::new();
        repl.run_with(input, &mut out, false).unwrap();
        assert_eq!(repl.session().repository().files().len(), 1);
        assert_eq!(repl.history(), &["add".to_string(), ".quit".to_string()]);
    }

    #[test]
    fn test_resolve_commit_references() {
        let mut repl = repl();
        run(&mut repl, "add");
        run(&mut repl, "stage 1");
        run(&mut repl, "commit");
        run(&mut repl, "modify 1 +1");
        run(&mut repl, "stage 1");
        run(&mut repl, "commit");

        let repo = repl.session().repository();
        let head = repo.head().unwrap();
        let first = repo.commits()[0].id();
        assert_eq!(resolve_commit(repo, "HEAD").unwrap(), head);
        assert_eq!(resolve_commit(repo, "head~1").unwrap(), first);
        assert_eq!(resolve_commit(repo, "HEAD~").unwrap(), first);
        assert!(resolve_commit(repo, "HEAD~2").unwrap_err().is_not_found());

        let short = repo.commits()[0].checksum().short();
        assert_eq!(resolve_commit(repo, &short).unwrap(), first);
    }

    #[test]
    fn test_log_output() {
        let mut repl = repl();
        assert_eq!(run(&mut repl, "log"), "(no commits)\n");

        run(&mut repl, "add");
        run(&mut repl, "stage-all");
        run(&mut repl, "commit");
        let log = run(&mut repl, "log");
        assert!(log.contains("(HEAD)"));
        assert!(log.contains("A file1"));
    }

    #[test]
    fn test_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesson.txt");
        fs::write(&path, "# first lesson\nadd\nadd notes\nstage-all\ncommit\n").unwrap();

        let mut repl = repl();
        let mut out = Vec::new();
        repl.run_script(&path, &mut out).unwrap();

        let repo = repl.session().repository();
        assert_eq!(repo.commits().len(), 1);
        assert!(repo.find_file("notes").is_ok());
    }

    #[test]
    fn test_script_stops_at_first_error() {
        let mut repl = repl();
        let mut out = Vec::new();
        let result = repl.run_commands(["add", "unstage 1", "add"], &mut out);

        assert!(matches!(
            result,
            Err(ReplError::Session(SessionError::Storage(
                StorageError::FileNotFound { .. }
            )))
        ));
        assert_eq!(repl.session().repository().files().len(), 1);
    }

    #[test]
    fn test_status_after_command() {
        let session = Session::with_config(SessionConfig::new().seed(1)).unwrap();
        let config = ReplConfig {
            show_status_after_command: true,
            ..ReplConfig::default()
        };
        let mut repl = Repl::with_config(session, config);
        let out = run(&mut repl, "add");
        assert!(out.contains("Working directory:"));
        assert!(out.contains("A file1"));
    }
}
