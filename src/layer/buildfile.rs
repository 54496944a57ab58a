//! Build file parsing
//!
//! A build file (`Strata.toml` by default) lists layers in order:
//!
//! ```toml
//! [[layer]]
//! instruction = "pip install -r requirements.txt"
//! files = ["requirements.txt"]
//!
//! [[layer]]
//! instruction = "cp -r app /srv/app"
//! files = ["app"]
//! env = ["PYTHONUNBUFFERED"]
//! ```
//!
//! Positions default to the 1-based index of the `[[layer]]` table. File
//! inputs are hashed relative to the build context; env inputs are resolved
//! to their current value.

use crate::error::{StrataError, StrataResult};
use crate::hash::ContentHasher;
use crate::layer::descriptor::InputRef;
use crate::layer::store::LayerStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default build file name, looked up in the current directory
pub const DEFAULT_BUILD_FILE: &str = "Strata.toml";

/// Parsed build file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
    /// Declared layers, in file order
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerSpec>,

    #[serde(skip)]
    path: PathBuf,
}

/// One `[[layer]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    /// Explicit sequence position (defaults to 1-based table index)
    pub position: Option<u64>,

    /// Instruction text, opaque to the cache
    pub instruction: String,

    /// Files or directories in the build context this layer reads
    #[serde(default)]
    pub files: Vec<String>,

    /// Environment variable names this layer reads
    #[serde(default)]
    pub env: Vec<String>,
}

impl BuildFile {
    /// Parse a build file from disk
    pub async fn from_file(path: &Path) -> StrataResult<Self> {
        if !path.exists() {
            return Err(StrataError::BuildFileNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StrataError::io(format!("reading build file {}", path.display()), e))?;
        Self::parse(&content, path)
    }

    /// Parse a build file from a TOML string
    pub fn parse(content: &str, path: &Path) -> StrataResult<Self> {
        let mut file: Self = toml::from_str(content).map_err(|e| StrataError::BuildFileInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        file.path = path.to_path_buf();
        Ok(file)
    }

    /// Directory that file inputs are resolved against
    pub fn context_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Resolve inputs against the build file's directory and the process
    /// environment, declaring every layer into a fresh store
    pub fn resolve(&self) -> StrataResult<LayerStore> {
        self.resolve_with(&self.context_dir(), |name| std::env::var(name).ok())
    }

    /// Resolve inputs against an explicit context directory and env lookup
    pub fn resolve_with<F>(&self, context: &Path, env_lookup: F) -> StrataResult<LayerStore>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut store = LayerStore::new();

        for (index, table) in self.layers.iter().enumerate() {
            if table.instruction.trim().is_empty() {
                return Err(self.invalid(format!("layer {} has an empty instruction", index + 1)));
            }

            let mut inputs = Vec::with_capacity(table.files.len() + table.env.len());

            for file in &table.files {
                let full = context.join(file);
                if !full.exists() {
                    return Err(self.invalid(format!(
                        "layer {} input not found: {}",
                        index + 1,
                        full.display()
                    )));
                }
                inputs.push(InputRef::file(file.clone(), ContentHasher::digest_path(&full)?));
            }

            for name in &table.env {
                inputs.push(InputRef::env(name.clone(), env_lookup(name)));
            }

            let position = table.position.unwrap_or(index as u64 + 1);
            store.declare(position, table.instruction.clone(), inputs)?;
        }

        debug!(
            "Resolved {} layer(s) from {}",
            store.len(),
            self.path.display()
        );
        Ok(store)
    }

    fn invalid(&self, reason: String) -> StrataError {
        StrataError::BuildFileInvalid {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const PYTHON_APP: &str = r#"
[[layer]]
instruction = "pip install -r requirements.txt"
files = ["requirements.txt"]

[[layer]]
instruction = "cp -r app /srv/app"
files = ["app"]
env = ["PYTHONUNBUFFERED"]
"#;

    fn context() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "django==5.0\n").unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/manage.py"), "print('hi')\n").unwrap();
        dir
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_and_resolve() {
        let dir = context();
        let file = BuildFile::parse(PYTHON_APP, &dir.path().join(DEFAULT_BUILD_FILE)).unwrap();
        assert_eq!(file.layers.len(), 2);

        let layers = file
            .resolve_with(dir.path(), |n| (n == "PYTHONUNBUFFERED").then(|| "1".to_string()))
            .unwrap()
            .into_layers();

        assert_eq!(layers[0].position(), 1);
        assert_eq!(layers[1].position(), 2);
        assert_eq!(layers[1].inputs().len(), 2);
        assert!(layers[1]
            .inputs()
            .contains(&InputRef::env("PYTHONUNBUFFERED", Some("1".into()))));
    }

    #[test]
    fn explicit_positions_respected() {
        let dir = context();
        let toml = r#"
[[layer]]
position = 20
instruction = "second"

[[layer]]
position = 10
instruction = "first"
"#;
        let file = BuildFile::parse(toml, Path::new("Strata.toml")).unwrap();
        let layers = file.resolve_with(dir.path(), no_env).unwrap().into_layers();
        assert_eq!(layers[0].instruction(), "first");
        assert_eq!(layers[1].instruction(), "second");
    }

    #[test]
    fn colliding_positions_error() {
        let dir = context();
        let toml = r#"
[[layer]]
instruction = "a"

[[layer]]
position = 1
instruction = "b"
"#;
        let file = BuildFile::parse(toml, Path::new("Strata.toml")).unwrap();
        let err = file.resolve_with(dir.path(), no_env).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateSequence { position: 1 }));
    }

    #[test]
    fn missing_input_file_errors() {
        let dir = TempDir::new().unwrap();
        let file = BuildFile::parse(PYTHON_APP, Path::new("Strata.toml")).unwrap();
        let err = file.resolve_with(dir.path(), no_env).unwrap_err();
        assert!(err.to_string().contains("input not found"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let toml = r#"
[[layer]]
instruction = "a"
inputs = ["x"]
"#;
        let err = BuildFile::parse(toml, Path::new("Strata.toml")).unwrap_err();
        assert!(matches!(err, StrataError::BuildFileInvalid { .. }));
    }

    #[test]
    fn empty_file_has_no_layers() {
        let file = BuildFile::parse("", Path::new("Strata.toml")).unwrap();
        let dir = TempDir::new().unwrap();
        assert!(file.resolve_with(dir.path(), no_env).unwrap().is_empty());
    }

    #[test]
    fn file_content_change_changes_input_digest() {
        let dir = context();
        let file = BuildFile::parse(PYTHON_APP, Path::new("Strata.toml")).unwrap();
        let before = file.resolve_with(dir.path(), no_env).unwrap().into_layers();

        fs::write(dir.path().join("app/manage.py"), "print('changed')\n").unwrap();
        let after = file.resolve_with(dir.path(), no_env).unwrap().into_layers();

        assert_eq!(before[0], after[0]);
        assert_ne!(before[1], after[1]);
    }

    #[tokio::test]
    async fn from_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = BuildFile::from_file(&dir.path().join("Strata.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::BuildFileNotFound(_)));
    }

    #[tokio::test]
    #[serial]
    async fn resolve_reads_process_env() {
        let dir = context();
        let path = dir.path().join(DEFAULT_BUILD_FILE);
        fs::write(&path, PYTHON_APP).unwrap();

        std::env::set_var("PYTHONUNBUFFERED", "1");
        let layers = BuildFile::from_file(&path)
            .await
            .unwrap()
            .resolve()
            .unwrap()
            .into_layers();
        std::env::remove_var("PYTHONUNBUFFERED");

        assert!(layers[1]
            .inputs()
            .contains(&InputRef::env("PYTHONUNBUFFERED", Some("1".into()))));
    }
}
