/// Controls how strictly schema documents are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, an id declared twice fails the load instead of the later entry winning.
    pub fail_on_duplicate_id: bool,
    /// When true, entries with an unknown conversion fail the load instead of failing on use.
    pub fail_on_unknown_conversion: bool,
    /// Maximum bytes read from a schema file.
    pub max_schema_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fail_on_duplicate_id: false,
            fail_on_unknown_conversion: false,
            max_schema_file_size: 1024 * 1024,
        }
    }
}
