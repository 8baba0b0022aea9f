//! Merge rules: built-in defaults every other layer overrides.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the storage defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.root", "_source")?
        .set_default("storage.schema_resource", "web-schema.json")?
        .set_default("storage.content_dir", "data")?
        .set_default("storage.media_dir", "media")
}
