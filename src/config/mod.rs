//! Layered configuration resolution.
//!
//! Resolves one typed configuration tree from five sources, lowest to
//! highest precedence:
//! 1. **Defaults** - declared in the compiled-in [`Schema`]
//! 2. **File** - project/user/explicit YAML, TOML or JSON files, deep-merged
//! 3. **Dotted env** - `app.database.port=5432`
//! 4. **Underscored env** - `APP_DATABASE_PORT=5432`
//! 5. **CLI** - `--database.port 5432`
//!
//! ## Merge Strategy
//! Each layer overwrites only the leaves it names. Every malformed input,
//! unknown key, unparseable value and constraint violation is collected, and
//! resolution fails with all of them at once or succeeds completely.

mod coerce;
mod files;
mod loader;
mod merge;
mod resolver;
mod schema;
pub mod sources;
mod tree;
mod validate;

pub use coerce::coerce;
pub use files::{
    ConfigFile, FileFormat, FileOrigin, ensure_map_root, parse_config_str, read_config_file,
};
pub use loader::{ConfigLoader, ConfigPaths};
pub use merge::{deep_merge, deep_merge_all, merge};
pub use resolver::{KeyResolver, PathMiss};
pub use schema::{Constraint, LeafDecl, LeafSpec, Pattern, Schema, SchemaBuilder, SchemaNode};
pub use tree::ConfigTree;
pub use validate::{satisfies, validate};
