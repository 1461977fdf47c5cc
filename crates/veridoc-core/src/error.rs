//! Error and warning types for a documentation run

use std::path::PathBuf;

use thiserror::Error;

/// A fatal failure of a documentation run. Everything here aborts the run;
/// recoverable conditions go through [`Reporter`] instead.
#[derive(Error, Debug)]
pub enum DocError {
    #[error("failed to create output directory '{path}'")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory '{path}' is not writable")]
    OutputDirNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}'")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unresolved reference to '{target}'")]
    DanglingReference { target: String },

    #[error("declaration tree has no root module '{root}'")]
    MissingRoot { root: String },
}

/// Collects non-fatal warnings during a generation run. Owned by the run and
/// handed back to the caller when it completes; the engine itself never
/// prints.
#[derive(Debug, Default)]
pub struct Reporter {
    warnings: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
