//! Layer 5: command-line flags.

use super::{LayerEntries, SourceAdapter};
use crate::types::LayerId;

/// Pairs pre-tokenized arguments into `--path value` entries.
///
/// Accepted forms:
/// - `--path value`
/// - `--path=value` (use this when the value itself starts with `--`)
/// - `--path` followed by another flag or the end of input, meaning `true`
#[derive(Debug, Clone, Copy)]
pub struct CliAdapter<'a> {
    args: &'a [String],
}

impl<'a> CliAdapter<'a> {
    pub fn new(args: &'a [String]) -> Self {
        Self { args }
    }
}

impl SourceAdapter for CliAdapter<'_> {
    fn layer(&self) -> LayerId {
        LayerId::Cli
    }

    fn produce(&self) -> LayerEntries {
        let mut out = LayerEntries::new(self.layer());
        let mut tokens = self.args.iter().peekable();

        while let Some(token) = tokens.next() {
            let Some(flag) = token.strip_prefix("--") else {
                out.reject(format!("expected a --setting flag, found '{}'", token));
                continue;
            };

            let (key, value) = match flag.split_once('=') {
                Some((key, value)) => (key, value.to_string()),
                None => match tokens.next_if(|next| !next.starts_with("--")) {
                    Some(value) => (flag, value.clone()),
                    None => (flag, "true".to_string()),
                },
            };

            if key.is_empty() {
                out.reject(format!("flag '{}' names no setting", token));
                continue;
            }
            out.push(key, value);
        }
        out
    }
}
