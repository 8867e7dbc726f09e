//! Output formatting utilities for markdown and JSON.

use crate::config::{ConfigTree, Schema, SchemaNode};
use crate::error::ResolutionErrors;
use serde_json::{Value, json};

/// Output format for resolved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

/// Format the resolved tree as a markdown table with provenance.
pub fn format_tree_markdown(tree: &ConfigTree) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Configuration ({} settings)\n\n", tree.len()));
    md.push_str("| setting | value | type | source |\n");
    md.push_str("|---|---|---|---|\n");
    for resolved in tree.iter() {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            resolved.path,
            escape_cell(&resolved.value.to_string()),
            resolved.value.leaf_type(),
            resolved.source
        ));
    }

    let counts = tree.layer_counts();
    if !counts.is_empty() {
        md.push_str("\n## Sources\n");
        for (layer, count) in counts {
            md.push_str(&format!("- **{}**: {}\n", layer, count));
        }
    }

    md
}

/// Format the resolved tree as JSON: the nested values plus the winning
/// layer of each leaf.
pub fn format_tree_json(tree: &ConfigTree) -> Value {
    let sources: serde_json::Map<String, Value> = tree
        .iter()
        .map(|r| (r.path.dotted(), json!(r.source)))
        .collect();
    json!({
        "config": tree.to_json(),
        "sources": sources,
    })
}

/// Format every leaf of the schema with its type, default and constraints.
pub fn format_schema_markdown(schema: &Schema, upper_prefix: &str) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Schema ({} settings)\n\n", schema.leaf_count()));
    for path in schema.leaf_paths() {
        let Some(SchemaNode::Leaf(spec)) = schema.lookup(path) else {
            continue;
        };
        md.push_str(&format!("## `{}`\n", path));
        md.push_str(&format!("- **type**: {}\n", spec.leaf_type));
        md.push_str(&format!("- **default**: `{}`\n", spec.default));
        md.push_str(&format!(
            "- **env**: `{}`\n",
            path.uppercase_env_name(upper_prefix)
        ));
        md.push_str(&format!("- **flag**: `{}`\n", path.flag()));
        if !spec.constraints.is_empty() {
            let constraints: Vec<String> = spec.constraints.iter().map(|c| c.to_string()).collect();
            md.push_str(&format!("- **constraints**: {}\n", constraints.join(", ")));
        }
        md.push('\n');
    }

    md
}

/// Format resolution errors, one line per offending key.
pub fn format_errors_markdown(errors: &ResolutionErrors) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Configuration errors ({})\n\n", errors.len()));
    for err in errors.errors() {
        md.push_str(&format!("- {}\n", err));
    }

    md
}

pub fn format_errors_json(errors: &ResolutionErrors) -> Value {
    json!({ "errors": errors.reports() })
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
