use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Comparison, SourceLocation};
use crate::validate::{CompilerError, ErrorKind, FunResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Base directory file imports are resolved against.
    pub project_root: PathBuf,
    /// Directory holding one directory per module. Relative paths are
    /// taken relative to `project_root`.
    pub modules_root: PathBuf,
    pub source_extension: String,
    pub code_extension: String,
    /// Runtime library emitted verbatim at the top of every program.
    pub library_path: PathBuf,
    /// JS expression the root hook is attached to.
    pub host_container: String,
    pub cache_dir: Option<PathBuf>,
    pub verify_output: bool,
    pub comparisons: Vec<Comparison>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            project_root: PathBuf::from("."),
            modules_root: PathBuf::from("Modules"),
            source_extension: "fun".to_string(),
            code_extension: "js".to_string(),
            library_path: PathBuf::from("lib.js"),
            host_container: "document.body".to_string(),
            cache_dir: None,
            verify_output: false,
            comparisons: Comparison::ALL.to_vec(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json_str(json: &str) -> FunResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            CompilerError::new(
                ErrorKind::Parse,
                format!("Invalid compiler config: {}", e),
                &SourceLocation::new("", e.line() as u32, e.column() as u32),
            )
        })
    }

    pub fn load(path: &Path) -> FunResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            CompilerError::unlocated(
                ErrorKind::Io,
                format!("Could not read compiler config {}: {}", path.display(), e),
            )
        })?;
        Self::from_json_str(&json).map_err(|e| e.in_file(&path.to_string_lossy()))
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.project_root.join(&self.modules_root)
    }

    pub fn allows(&self, comparison: Comparison) -> bool {
        self.comparisons.contains(&comparison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            CompilerConfig::from_json_str(r#"{"projectRoot": "app", "comparisons": ["==", "<"]}"#)
                .unwrap();
        assert_eq!(config.project_root, PathBuf::from("app"));
        assert_eq!(config.modules_dir(), PathBuf::from("app/Modules"));
        assert_eq!(config.source_extension, "fun");
        assert!(config.allows(Comparison::Eq));
        assert!(!config.allows(Comparison::Ge));
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fun.json");
        fs::write(&path, "{\"verifyOutput\": 3}").unwrap();
        let err = CompilerConfig::load(&path).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.file.ends_with("fun.json"));

        let missing = CompilerConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.kind, ErrorKind::Io);
    }
}
