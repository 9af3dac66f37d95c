use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors raised while building or running the launch command.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The client jar is missing or is not a regular file.
    #[error("client jar not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// A directory the command depends on is missing.
    #[error("{kind} directory not found: {}", path.display())]
    DirectoryNotFound { kind: &'static str, path: PathBuf },

    /// The command has no program to run.
    #[error("launch command is empty")]
    EmptyCommand,

    /// The OS refused to start the child process.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Reading the child's output failed.
    #[error("failed to read game output: {0}")]
    Output(#[source] io::Error),

    /// No async runtime could be created to drive the child.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The base path could not be derived from the working directory.
    #[error("failed to resolve working directory: {0}")]
    WorkingDirectory(#[source] io::Error),
}

impl LaunchError {
    /// Returns true for errors raised before anything was spawned because a
    /// required file or directory was missing.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LaunchError::ArtifactNotFound(_) | LaunchError::DirectoryNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;

#[test]
fn test_directory_not_found_message() {
    let err = LaunchError::DirectoryNotFound {
        kind: "natives",
        path: PathBuf::from("/tmp/downloads/natives"),
    };
    assert_eq!(
        err.to_string(),
        "natives directory not found: /tmp/downloads/natives"
    );
    assert!(err.is_precondition());
    assert!(!LaunchError::EmptyCommand.is_precondition());
}
