//! Stable identifiers: schema IDs, cache file naming, and overlay file names.

/// Extension appended to an artifact name to form its cache file name.
pub const CACHE_EXTENSION: &str = "json";

/// Directory (under the user's home) holding cached artifacts.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".posture";

/// Environment variable overriding the cache directory.
pub const ENV_CACHE_DIR: &str = "POSTURE_CACHE_DIR";

// Overlay files inside a local policy directory
pub const EXCEPTIONS_FILE: &str = "exceptions.json";
pub const CONTROLS_INPUTS_FILE: &str = "controls-inputs.json";

// Config
pub const SCHEMA_CONFIG_V1: &str = "posture.config.v1";
pub const DEFAULT_CONFIG_FILE: &str = "posture.toml";

/// Whether `name` can become a single file name or URL path segment.
///
/// Rejects empty names, surrounding whitespace, path separators, and `..`.
pub fn is_safe_artifact_name(name: &str) -> bool {
    let trimmed = name.trim();
    !(trimmed.is_empty()
        || trimmed != name
        || name.contains('/')
        || name.contains('\\')
        || name.contains(".."))
}

/// Cache file name for an artifact: `<name>.json`.
pub fn cache_file_name(name: &str) -> String {
    format!("{name}.{CACHE_EXTENSION}")
}
