//! Resolution error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// A header no classification rule matched.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UnresolvedHeader {
    /// Target whose files include the header
    pub target: String,
    /// The header path as written in the include directive
    pub header: String,
}

/// Error during dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read `{}` declared by `{target}`", .path.display())]
    UnreadableSource {
        target: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't categorize {} header(s)", .headers.len())]
    Unresolvable { headers: Vec<UnresolvedHeader> },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnreadableSource {
                target,
                path,
                source,
            } => Diagnostic::error(format!("failed to read a file of `{}`", target))
                .with_location(path)
                .with_context(source.to_string())
                .with_suggestion(format!(
                    "Check the hdrs, public_hdrs and srcs lists of `{}`",
                    target
                )),

            ResolveError::Unresolvable { headers } => {
                let mut diag = Diagnostic::error(self.to_string());
                for unresolved in headers {
                    diag = diag.with_context(format!(
                        "{} (included by `{}`)",
                        unresolved.header, unresolved.target
                    ));
                }
                diag.with_suggestion(
                    "Declare the header in a library's hdrs or public_hdrs".to_string(),
                )
                .with_suggestion(
                    "Add it to [mappings] external, internal or skip in .autodeps/config.toml"
                        .to_string(),
                )
            }
        }
    }
}
