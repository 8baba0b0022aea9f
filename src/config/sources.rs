//! Config sources: global file, workspace files, environment.

pub mod global_file;
pub mod workspace_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// `FOLIO__AUTH__SECRET=...` sets `auth.secret`
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("FOLIO")
            .separator("__")
            .try_parsing(true),
    )
}
