//! Session API - the tutorial-facing interface over one repository.

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::action::{Action, Outcome};
use super::console::Console;
use crate::storage::{
    CommitId, FileId, Modification, Repository, RepositorySnapshot, StorageError,
};

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("another command is still being applied")]
    Busy,

    #[error("replay failed at action {position} ({action}): {source}")]
    Replay {
        position: usize,
        action: String,
        #[source]
        source: StorageError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionError {
    /// check if the learner can just be told and carry on
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::Storage(e) => e.is_recoverable(),
            SessionError::Busy => true,
            _ => false,
        }
    }
}

/// Session configuration options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seed for random modifications; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Upper bound of inserted lines per random modification.
    pub max_insertions: u32,
    /// Upper bound of deleted lines per random modification.
    pub max_deletions: u32,
    /// Number of console entries kept.
    pub console_capacity: usize,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_insertions: 10,
            max_deletions: 5,
            console_capacity: 100,
            verbose: false,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the random seed.
    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Set the bounds of random modifications.
    pub fn modification_limits(mut self, max_insertions: u32, max_deletions: u32) -> Self {
        self.max_insertions = max_insertions;
        self.max_deletions = max_deletions;
        self
    }

    /// Set the console capacity.
    pub fn console_capacity(mut self, value: usize) -> Self {
        self.console_capacity = value;
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    fn validate(&self) -> SessionResult<()> {
        if self.max_insertions == 0 {
            return Err(SessionError::InvalidConfig(
                "max_insertions must be at least 1".into(),
            ));
        }
        if self.max_insertions > i32::MAX as u32 || self.max_deletions > i32::MAX as u32 {
            return Err(SessionError::InvalidConfig(
                "modification limits are too large".into(),
            ));
        }
        if self.console_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "console_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// One tutorial session: a repository plus its console and journal.
///
/// Commands go through [`Session::dispatch`], which applies them one at a
/// time, logs the result to the console and journals successful actions.
pub struct Session {
    config: SessionConfig,
    repo: Repository,
    rng: StdRng,
    console: Console,
    journal: Vec<Action>,
}

impl Session {
    /// Create a session with the default configuration.
    pub fn new() -> Self {
        let config = SessionConfig::default();
        Self {
            rng: config.rng(),
            console: Console::new(config.console_capacity),
            config,
            repo: Repository::new(),
            journal: Vec::new(),
        }
    }

    /// Create a session with custom configuration.
    pub fn with_config(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            console: Console::new(config.console_capacity),
            config,
            repo: Repository::new(),
            journal: Vec::new(),
        })
    }

    /// Rebuild a session by applying `actions` in order.
    ///
    /// Fails on the first action that does not apply.
    pub fn replay<I>(config: SessionConfig, actions: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = Action>,
    {
        let mut session = Self::with_config(config)?;
        for (position, action) in actions.into_iter().enumerate() {
            let label = action.to_string();
            session.dispatch(action).map_err(|e| match e {
                SessionError::Storage(source) => SessionError::Replay {
                    position,
                    action: label,
                    source,
                },
                other => other,
            })?;
        }
        info!(actions = session.journal.len(), "session replayed");
        Ok(session)
    }

    /// Apply one action.
    ///
    /// On failure the repository is left untouched, the error is written to
    /// the console and returned.
    #[instrument(skip(self, action), fields(kind = action.kind()))]
    pub fn dispatch(&mut self, action: Action) -> SessionResult<Outcome> {
        if self.config.verbose {
            debug!(%action, "dispatch");
        }

        match self.apply(&action) {
            Ok(outcome) => {
                let message = self.describe(&action, &outcome);
                self.console.log(action.kind(), message);
                self.journal.push(action);
                Ok(outcome)
            }
            Err(e) => {
                warn!(%action, error = %e, "command rejected");
                self.console.error(action.kind(), e.to_string());
                Err(e.into())
            }
        }
    }

    fn apply(&mut self, action: &Action) -> Result<Outcome, StorageError> {
        let outcome = match action {
            Action::AddFile { name } => Outcome::File(self.repo.add_named_file(name.clone()).id),
            Action::ModifyFile {
                file,
                insertions,
                deletions,
            } => Outcome::File(
                self.repo
                    .modify_file(*file, Modification::new(*insertions, *deletions))?,
            ),
            Action::DeleteFile { file } => Outcome::File(self.repo.delete_file(*file)?),
            Action::StageFile { file } => Outcome::File(self.repo.stage_file(*file)?),
            Action::StageAllFiles => Outcome::Files(self.repo.stage_all_files()),
            Action::UnstageFile { file } => Outcome::File(self.repo.unstage_file(*file)?),
            Action::CreateCommit => Outcome::Commit(self.repo.create_commit()?),
            Action::RevertCommit { commit } => Outcome::Commit(self.repo.revert_commit(*commit)?),
        };
        Ok(outcome)
    }

    fn file_name(&self, file: FileId) -> String {
        self.repo.files().name_of(file)
    }

    fn commit_label(&self, commit: CommitId) -> String {
        self.repo
            .commit(commit)
            .map(|c| c.checksum().short())
            .unwrap_or_else(|_| commit.to_string())
    }

    fn describe(&self, action: &Action, outcome: &Outcome) -> String {
        match (action, outcome) {
            (Action::AddFile { .. }, Outcome::File(file)) => {
                format!("A new file {} was added.", self.file_name(*file))
            }
            (
                Action::ModifyFile {
                    insertions,
                    deletions,
                    ..
                },
                Outcome::File(file),
            ) => format!(
                "File {} was modified ({}).",
                self.file_name(*file),
                Modification::new(*insertions, *deletions)
            ),
            (Action::DeleteFile { .. }, Outcome::File(file)) => {
                format!("File {} was deleted.", self.file_name(*file))
            }
            (Action::StageFile { .. }, Outcome::File(file)) => {
                format!("File {} was added to the staging area.", self.file_name(*file))
            }
            (Action::StageAllFiles, Outcome::Files(files)) if files.is_empty() => {
                "There were no files to add to the staging area.".to_string()
            }
            (Action::StageAllFiles, Outcome::Files(_)) => {
                "All files were added to the staging area.".to_string()
            }
            (Action::UnstageFile { .. }, Outcome::File(file)) => {
                format!("File {} was removed from the staging area.", self.file_name(*file))
            }
            (Action::CreateCommit, Outcome::Commit(commit)) => format!(
                "New commit {} was stored in the repository.",
                self.commit_label(*commit)
            ),
            (Action::RevertCommit { .. }, Outcome::Commit(commit)) => format!(
                "Commit {} was reverted successfully.",
                self.commit_label(*commit)
            ),
            _ => action.to_string(),
        }
    }

    /// An action modifying `file` by a random amount.
    ///
    /// The amount is drawn now and fixed in the action.
    pub fn random_modification(&mut self, file: FileId) -> Action {
        let m = Modification::random(
            &mut self.rng,
            self.config.max_insertions,
            self.config.max_deletions,
        );
        Action::ModifyFile {
            file,
            insertions: m.insertions,
            deletions: m.deletions,
        }
    }

    // ==================== Command shortcuts ====================

    pub fn add_file(&mut self) -> SessionResult<FileId> {
        match self.dispatch(Action::AddFile { name: None })? {
            Outcome::File(file) => Ok(file),
            other => Err(unexpected(other)),
        }
    }

    /// Modify a file by a random amount.
    pub fn modify_file(&mut self, file: FileId) -> SessionResult<FileId> {
        let action = self.random_modification(file);
        self.expect_file(action)
    }

    /// Modify a file by the given amount.
    pub fn modify_file_by(&mut self, file: FileId, modification: Modification) -> SessionResult<FileId> {
        self.expect_file(Action::ModifyFile {
            file,
            insertions: modification.insertions,
            deletions: modification.deletions,
        })
    }

    pub fn delete_file(&mut self, file: FileId) -> SessionResult<FileId> {
        self.expect_file(Action::DeleteFile { file })
    }

    pub fn stage_file(&mut self, file: FileId) -> SessionResult<FileId> {
        self.expect_file(Action::StageFile { file })
    }

    pub fn stage_all_files(&mut self) -> SessionResult<Vec<FileId>> {
        match self.dispatch(Action::StageAllFiles)? {
            Outcome::Files(files) => Ok(files),
            other => Err(unexpected(other)),
        }
    }

    pub fn unstage_file(&mut self, file: FileId) -> SessionResult<FileId> {
        self.expect_file(Action::UnstageFile { file })
    }

    pub fn create_commit(&mut self) -> SessionResult<CommitId> {
        self.expect_commit(Action::CreateCommit)
    }

    pub fn revert_commit(&mut self, commit: CommitId) -> SessionResult<CommitId> {
        self.expect_commit(Action::RevertCommit { commit })
    }

    fn expect_file(&mut self, action: Action) -> SessionResult<FileId> {
        match self.dispatch(action)? {
            Outcome::File(file) => Ok(file),
            other => Err(unexpected(other)),
        }
    }

    fn expect_commit(&mut self, action: Action) -> SessionResult<CommitId> {
        match self.dispatch(action)? {
            Outcome::Commit(commit) => Ok(commit),
            other => Err(unexpected(other)),
        }
    }

    // ==================== Accessors ====================

    /// Start over: empty repository, console and journal.
    pub fn reset(&mut self) {
        self.repo = Repository::new();
        self.console.clear();
        self.journal.clear();
        self.rng = self.config.rng();
        info!("session reset");
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Successfully applied actions, in order.
    pub fn journal(&self) -> &[Action] {
        &self.journal
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolved state of all areas.
    pub fn snapshot(&self) -> SessionResult<RepositorySnapshot> {
        Ok(self.repo.snapshot()?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn unexpected(outcome: Outcome) -> SessionError {
    SessionError::Storage(StorageError::Internal(format!(
        "unexpected outcome {:?}",
        outcome
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::console::ConsoleLevel;
    use crate::storage::{ChangeStatus, DiffStats};

    fn session() -> Session {
        Session::with_config(SessionConfig::new().seed(42)).unwrap()
    }

    #[test]
    fn test_dispatch_logs_and_journals() {
        let mut s = session();
        let file = s.add_file().unwrap();
        s.stage_file(file).unwrap();
        let commit = s.create_commit().unwrap();

        assert_eq!(s.journal().len(), 3);
        assert_eq!(s.console().len(), 3);
        let checksum = s.repository().commit(commit).unwrap().checksum().short();
        let last = s.console().last().unwrap();
        assert_eq!(last.level, ConsoleLevel::Log);
        assert_eq!(
            last.message,
            format!("New commit {} was stored in the repository.", checksum)
        );
    }

    #[test]
    fn test_rejected_command_is_reported_not_journaled() {
        let mut s = session();
        let file = s.add_file().unwrap();
        s.stage_file(file).unwrap();

        let result = s.stage_file(file);
        assert!(matches!(
            result,
            Err(SessionError::Storage(StorageError::AlreadyStaged(_)))
        ));
        assert!(result.unwrap_err().is_recoverable());
        assert_eq!(s.journal().len(), 2);

        let last = s.console().last().unwrap();
        assert_eq!(last.level, ConsoleLevel::Error);
        assert_eq!(last.action, "STAGE_FILE");
    }

    #[test]
    fn test_random_modification_uses_limits() {
        let mut s = Session::with_config(
            SessionConfig::new().seed(3).modification_limits(4, 2),
        )
        .unwrap();
        let file = s.add_file().unwrap();
        for _ in 0..20 {
            s.modify_file(file).unwrap();
        }

        for action in &s.journal()[1..] {
            match action {
                Action::ModifyFile {
                    insertions,
                    deletions,
                    ..
                } => {
                    assert!((1..=4).contains(insertions));
                    assert!((0..=2).contains(deletions));
                }
                other => panic!("unexpected action {other:?}"),
            }
        }
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let mut s = session();
        let a = s.add_file().unwrap();
        let b = s.add_file().unwrap();
        s.modify_file(a).unwrap();
        s.stage_all_files().unwrap();
        let c1 = s.create_commit().unwrap();
        s.modify_file(b).unwrap();
        s.delete_file(a).unwrap();
        s.stage_all_files().unwrap();
        s.create_commit().unwrap();
        s.revert_commit(c1).unwrap();

        let replayed = Session::replay(SessionConfig::new(), s.journal().to_vec()).unwrap();
        let original = s.snapshot().unwrap();
        let rebuilt = replayed.snapshot().unwrap();

        assert_eq!(original.working_directory, rebuilt.working_directory);
        assert_eq!(original.staging_area, rebuilt.staging_area);
        assert_eq!(original.commits.len(), rebuilt.commits.len());
        assert_eq!(replayed.journal(), s.journal());
    }

    #[test]
    fn test_replay_reports_failing_action() {
        let actions = vec![
            Action::AddFile { name: None },
            Action::UnstageFile { file: FileId::new(0) },
        ];
        let result = Session::replay(SessionConfig::new(), actions);
        assert!(matches!(result, Err(SessionError::Replay { position: 1, .. })));
    }

    #[test]
    fn test_reset() {
        let mut s = session();
        s.add_file().unwrap();
        s.reset();
        assert!(s.journal().is_empty());
        assert!(s.console().is_empty());
        assert_eq!(s.repository().files().len(), 0);
    }

    #[test]
    fn test_invalid_config() {
        let result = Session::with_config(SessionConfig::new().modification_limits(0, 1));
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));

        let result = Session::with_config(SessionConfig::new().console_capacity(0));
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_stage_all_message() {
        let mut s = session();
        s.stage_all_files().unwrap();
        assert_eq!(
            s.console().last().unwrap().message,
            "There were no files to add to the staging area."
        );

        let file = s.add_file().unwrap();
        let staged = s.stage_all_files().unwrap();
        assert_eq!(staged, vec![file]);
        assert_eq!(
            s.console().last().unwrap().message,
            "All files were added to the staging area."
        );
    }

    #[test]
    fn test_signed_modification_message() {
        let mut s = session();
        let file = s.add_file().unwrap();
        s.modify_file_by(file, Modification::new(4, 2)).unwrap();
        assert_eq!(
            s.console().last().unwrap().message,
            "File file1 was modified (+4 -2)."
        );

        s.modify_file_by(file, Modification::new(-1, 0)).unwrap();
        assert_eq!(
            s.console().last().unwrap().message,
            "File file1 was modified (-1 inserted, +0 deleted)."
        );
    }

    #[test]
    fn test_modify_by_exact_amount() {
        let mut s = session();
        let file = s.add_file().unwrap();
        s.stage_file(file).unwrap();
        s.create_commit().unwrap();
        s.modify_file_by(file, Modification::new(3, 1)).unwrap();
        s.modify_file_by(file, Modification::new(2, 0)).unwrap();

        let snapshot = s.snapshot().unwrap();
        assert_eq!(snapshot.working_directory[0].status, ChangeStatus::Modified);
        assert_eq!(snapshot.working_directory[0].stats, DiffStats::new(5, 1));
    }
}
