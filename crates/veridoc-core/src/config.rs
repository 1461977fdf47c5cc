//! Run configuration for a documentation pass

use std::path::{Path, PathBuf};

/// How "From file" annotations display a declaration's source path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileRefMode {
    /// File name only.
    #[default]
    Name,
    /// No file annotations at all.
    None,
    /// The absolute path as given.
    Absolute,
    /// Path relative to the given prefix.
    Relative(PathBuf),
}

impl FileRefMode {
    /// Parses the `--file-ref` option value. Accepts `relative=PREFIX` and
    /// `relative:PREFIX`; unrecognized values fall back to the file-name
    /// form.
    pub fn parse(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "absolute" => Self::Absolute,
            _ if value.starts_with("relative") => {
                let prefix = value["relative".len()..].trim_start_matches(['=', ':']);
                Self::Relative(PathBuf::from(prefix))
            }
            _ => Self::Name,
        }
    }

    /// The displayed form of `path`, or `None` when file references are off.
    pub fn display(&self, path: &Path) -> Option<String> {
        match self {
            Self::Name => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Self::None => None,
            Self::Absolute => Some(path.display().to_string()),
            Self::Relative(prefix) => {
                Some(path.strip_prefix(prefix).unwrap_or(path).display().to_string())
            }
        }
    }
}

/// Options consumed by the generation engine.
#[derive(Debug, Clone)]
pub struct DocConfig {
    pub output_dir: PathBuf,
    pub file_ref: FileRefMode,
    pub show_modify_time: bool,
    /// Optional program display name used in page titles and headers.
    pub program_name: Option<String>,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./docs"),
            file_ref: FileRefMode::default(),
            show_modify_time: false,
            program_name: None,
        }
    }
}

impl DocConfig {
    /// ` for NAME` suffix used in page headers; empty without a program name.
    pub fn program_header(&self) -> String {
        self.program_name
            .as_ref()
            .map(|n| format!(" for {n}"))
            .unwrap_or_default()
    }

    /// ` in program NAME` suffix used in page titles.
    pub fn program_title(&self) -> String {
        self.program_name
            .as_ref()
            .map(|n| format!(" in program {n}"))
            .unwrap_or_default()
    }
}
