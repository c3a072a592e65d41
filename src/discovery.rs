//! Module discovery.
//!
//! Scans the modules root for module directories. Used to tell the user
//! which modules do exist when an import names one that doesn't.

use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleListing {
    pub name: String,
    pub path: String,
    pub has_source: bool,
    pub has_code: bool,
}

/// Lists every module directory directly under `root`, sorted by name.
/// A missing or unreadable root yields an empty list.
pub fn discover_modules(root: &Path, source_ext: &str, code_ext: &str) -> Vec<ModuleListing> {
    if !root.is_dir() {
        return vec![];
    }

    let mut modules: Vec<ModuleListing> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let dir = entry.path();
            ModuleListing {
                has_source: dir.join(format!("{}.{}", name, source_ext)).is_file(),
                has_code: dir.join(format!("{}.{}", name, code_ext)).is_file(),
                path: dir.to_string_lossy().to_string(),
                name,
            }
        })
        .collect();

    modules.sort_by(|a, b| a.name.cmp(&b.name));
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_modules() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Todo")).unwrap();
        fs::write(dir.path().join("Todo/Todo.fun"), "[]").unwrap();
        fs::create_dir_all(dir.path().join("Button")).unwrap();
        fs::write(dir.path().join("Button/Button.js"), "//").unwrap();
        fs::write(dir.path().join("README"), "not a module").unwrap();

        let modules = discover_modules(dir.path(), "fun", "js");
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Button", "Todo"]);
        assert!(modules[0].has_code && !modules[0].has_source);
        assert!(modules[1].has_source && !modules[1].has_code);
    }

    #[test]
    fn test_missing_root_is_empty() {
        assert!(discover_modules(Path::new("/definitely/not/here"), "fun", "js").is_empty());
    }
}
