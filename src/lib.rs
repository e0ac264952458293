//! stagecraft - a working directory / staging area / commit playground
//!
//! This crate models the three areas a version control learner has to keep
//! apart: files are edited in the working directory, picked into the
//! staging area, and frozen into commits. Every file version is an
//! immutable snapshot, so a commit keeps exactly what was staged no matter
//! what happens to the working directory afterwards.
//!
//! # Example
//!
//! ```
//! use stagecraft::session::{Session, SessionConfig};
//!
//! let mut session = Session::with_config(SessionConfig::new().seed(1)).unwrap();
//! let file = session.add_file().unwrap();
//! session.stage_file(file).unwrap();
//! session.create_commit().unwrap();
//! assert_eq!(session.repository().commits().len(), 1);
//! ```

pub mod session;
pub mod storage;
