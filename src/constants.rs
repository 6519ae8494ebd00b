//! Common constants used throughout kiln.

/// Supported configuration file names, in lookup order
pub const CONFIG_FILES: [&str; 3] = ["kiln.json", "kiln.yml", "kiln.yaml"];

/// JSON schema the configuration file is validated against before loading
pub const CONFIG_SCHEMA: &str = include_str!("schema.json");

/// Separator used by append and prepend when none is configured
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Number of compiled inline templates the renderer keeps around
pub const TEMPLATE_CACHE_LIMIT: usize = 256;

/// Name prefix for cached inline templates, keeps them apart from partials
pub const INLINE_TEMPLATE_PREFIX: &str = "kiln:inline:";
