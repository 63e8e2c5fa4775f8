use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

// Structure to represent an external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub name: String,
    pub path: PathBuf,
}

impl ExternalTool {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Имя исполняемого файла без расширения, например "espeak-ng"
    pub fn program_name(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.name)
    }
}

/// Check if a command is available in PATH
pub fn check_command_in_path(command: &str) -> Result<PathBuf> {
    which::which(command).with_context(|| format!("{} not found in PATH", command))
}

/// Возвращает первую найденную в PATH программу из списка кандидатов
pub fn find_first_tool<S: AsRef<str>>(candidates: &[S]) -> Option<ExternalTool> {
    for candidate in candidates {
        let name = candidate.as_ref();
        match check_command_in_path(name) {
            Ok(path) => {
                info!("Found {} at {}", name, path.display());
                return Some(ExternalTool::new(name, path));
            }
            Err(e) => debug!("{}", e),
        }
    }
    None
}
