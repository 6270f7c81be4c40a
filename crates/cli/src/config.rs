//! Data directory configuration.
//!
//! A data directory holds `config.json`, which names the schema file and
//! hash function, and the sled word store under `words/`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slotscope_core::{Declaration, HashKind, SlotHasher};
use slotscope_layout::StorageLayout;
use slotscope_schema::parse_declaration;
use slotscope_storage::SledStore;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";
const STORE_DIR: &str = "words";

/// Persisted settings of a data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Declaration file, in the declaration language or JSON.
    pub schema: PathBuf,
    #[serde(default)]
    pub hash: HashKind,
}

impl ToolConfig {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let text = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read {:?} (run 'slotscope init' first)",
                path
            )
        })?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config file: {:?}", path))
    }
}

/// Read and parse a declaration file.
pub fn load_declaration(path: &Path) -> Result<Declaration> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read schema: {:?}", path))?;
    parse_declaration(&source).with_context(|| format!("Failed to parse schema: {:?}", path))
}

/// Everything a command needs to work against a data directory.
pub struct Workspace {
    pub config: ToolConfig,
    pub declaration: Declaration,
    pub layout: StorageLayout<Box<dyn SlotHasher>>,
}

impl Workspace {
    /// Load the config and schema, and allocate the layout.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config = ToolConfig::load(data_dir)?;
        let declaration = load_declaration(&config.schema)?;
        let layout = StorageLayout::new(&declaration, config.hash.hasher())
            .with_context(|| "Failed to allocate storage layout")?;
        Ok(Self {
            config,
            declaration,
            layout,
        })
    }
}

/// Open (or create) the word store of a data directory.
pub fn open_store(data_dir: &Path) -> Result<SledStore> {
    let path = data_dir.join(STORE_DIR);
    SledStore::open(&path).with_context(|| format!("Failed to open word store: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotscope_core::{AccessPath, TypeDescriptor, Value};
    use tempfile::TempDir;

    fn data_dir_with_schema(source: &str, hash: HashKind) -> TempDir {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("schema.sol");
        fs::write(&schema, source).unwrap();
        ToolConfig { schema, hash }.save(dir.path()).unwrap();
        dir
    }

    #[test]
    fn test_config_round_trip() {
        let dir = data_dir_with_schema("uint8 a;", HashKind::Blake3);
        let config = ToolConfig::load(dir.path()).unwrap();

        assert_eq!(config.hash, HashKind::Blake3);
        assert!(config.schema.ends_with("schema.sol"));
    }

    #[test]
    fn test_hash_defaults_to_keccak() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"schema": "x.sol"}"#).unwrap();

        assert_eq!(
            ToolConfig::load(dir.path()).unwrap().hash,
            HashKind::Keccak256
        );
    }

    #[test]
    fn test_missing_config() {
        let dir = TempDir::new().unwrap();
        let err = ToolConfig::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("slotscope init"));
    }

    #[test]
    fn test_workspace_reads_back_through_store() {
        let dir = data_dir_with_schema("bool flag;\nuint64 count;", HashKind::Keccak256);
        let workspace = Workspace::load(dir.path()).unwrap();
        assert_eq!(workspace.declaration.get("count"), Some(&TypeDescriptor::Uint(8)));

        let root = AccessPath::new();
        {
            let store = open_store(dir.path()).unwrap();
            workspace
                .layout
                .write_value(&store, "count", &root, &Value::uint(12))
                .unwrap();
            store.flush().unwrap();
        }

        let store = open_store(dir.path()).unwrap();
        assert_eq!(
            workspace.layout.read_value(&store, "count", &root).unwrap(),
            Value::uint(12)
        );
        assert_eq!(store.len(), 1);
    }
}
