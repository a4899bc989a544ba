use std::io::Read;
use std::path::Path;

use edgecfg_codec::Conversion;
use indexmap::IndexMap;

use crate::config::RegistryConfig;
use crate::entry::{EntrySpec, Group, SchemaDocument, SchemaEntry};
use crate::error::{Result, SchemaError};
use crate::id::SettingId;

/// Id-keyed index over the settings and values of one schema document.
///
/// A registry is built whole from a document and never updated in place;
/// loading a new schema means building a new registry. Entries keep
/// document order; a duplicate id keeps the slot of the entry it replaces.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entries: IndexMap<SettingId, SchemaEntry>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: IndexMap::new(),
            config,
        }
    }

    /// Index both groups of a document. Values are merged after settings.
    pub fn load(doc: &SchemaDocument) -> Result<Self> {
        Self::load_with_config(doc, RegistryConfig::default())
    }

    /// Index a document with explicit config.
    pub fn load_with_config(doc: &SchemaDocument, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for (name, spec) in &doc.settings {
            registry.register(name, Group::Settings, spec.clone())?;
        }
        for (name, spec) in &doc.values {
            registry.register(name, Group::Values, spec.clone())?;
        }

        tracing::debug!(
            settings = doc.settings.len(),
            values = doc.values.len(),
            entries = registry.len(),
            "schema loaded"
        );
        Ok(registry)
    }

    /// Parse and index a JSON schema document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, RegistryConfig::default())
    }

    /// Parse and index a JSON schema document with explicit config.
    pub fn from_json_with_config(json: &str, config: RegistryConfig) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        Self::load_with_config(&doc, config)
    }

    /// Load a schema file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, RegistryConfig::default())
    }

    /// Load a schema file with explicit config.
    pub fn from_file_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        let max_bytes = config.max_schema_file_size;
        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_bytes {
            return Err(SchemaError::LoadFailed(format!(
                "schema file too large (max {max_bytes} bytes): {}",
                path.display()
            )));
        }

        Self::from_json_with_config(&content, config)
    }

    /// Add one entry.
    pub fn register(&mut self, name: &str, group: Group, spec: EntrySpec) -> Result<()> {
        let entry = SchemaEntry::from_spec(name, group, spec);

        if self.config.fail_on_unknown_conversion {
            Conversion::resolve(&entry.name, &entry.conversion_name)?;
        }

        if let Some(previous) = self.entries.get(&entry.id) {
            if self.config.fail_on_duplicate_id {
                return Err(SchemaError::DuplicateId {
                    id: entry.id,
                    first: previous.name.clone(),
                    second: entry.name,
                });
            }
            tracing::warn!(
                id = %entry.id,
                replaced = %previous.name,
                by = %entry.name,
                "duplicate schema id"
            );
        }

        self.entries.insert(entry.id, entry);
        Ok(())
    }

    /// Find the entry for an id given as `u8`, another integer, `"0xNN"`, or [`SettingId`].
    pub fn lookup<I>(&self, id: I) -> Result<&SchemaEntry>
    where
        I: TryInto<SettingId>,
        SchemaError: From<I::Error>,
    {
        let id = id.try_into()?;
        self.entries
            .get(&id)
            .ok_or(SchemaError::UnknownSettingId(id))
    }

    /// Entry for an already-normalized id.
    pub fn get(&self, id: SettingId) -> Option<&SchemaEntry> {
        self.entries.get(&id)
    }

    /// Settings in document order.
    pub fn settings(&self) -> Vec<&SchemaEntry> {
        self.group(Group::Settings)
    }

    /// Readable values in document order.
    pub fn values(&self) -> Vec<&SchemaEntry> {
        self.group(Group::Values)
    }

    /// All registered ids, ascending.
    pub fn ids(&self) -> Vec<SettingId> {
        let mut ids: Vec<SettingId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn group(&self, group: Group) -> Vec<&SchemaEntry> {
        self.entries
            .values()
            .filter(|entry| entry.group == group)
            .collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
