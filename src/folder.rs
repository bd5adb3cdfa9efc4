//! Folder discovery filtering and destination-name normalization.

use serde::{Deserialize, Serialize};

/// Fixed substrings that mark a folder as a server-internal mailbox never
/// worth transferring, in addition to the pure-delimiter and empty names.
const SKIP_SUBSTRINGS: &[&str] = &["[Gmail]", "Notes", "Contacts"];

/// Pure-delimiter or otherwise meaningless folder names to always drop.
const SKIP_EXACT: &[&str] = &["", "|", "/", ".", ".."];

/// Whether a discovered source folder name should be skipped entirely.
///
/// The filter is substring-based and case-sensitive, matching the
/// contract: an exact pure-delimiter/empty name, or a name containing one
/// of the fixed vendor-folder substrings.
#[must_use]
pub fn is_skipped(name: &str) -> bool {
    SKIP_EXACT.contains(&name) || SKIP_SUBSTRINGS.iter().any(|s| name.contains(s))
}

/// The destination-namespace rewrite rule, configurable per §9's open
/// question (resolved: exposed rather than hard-coded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceRewrite {
    /// Destination folder name is used unchanged.
    Off,
    /// Always prepend `INBOX.` unless already present.
    AlwaysPrefix,
    /// Prepend `INBOX.` only for names that are not `INBOX` and do not
    /// already start with `INBOX.`. The default, matching servers whose
    /// subfolder namespace is rooted under INBOX.
    #[default]
    PrefixWhenNested,
}

impl NamespaceRewrite {
    /// Apply the rule to a source folder name, producing the destination
    /// name to use.
    #[must_use]
    pub fn normalize(self, name: &str) -> String {
        match self {
            Self::Off => name.to_string(),
            Self::AlwaysPrefix | Self::PrefixWhenNested => {
                if name == "INBOX" || name.starts_with("INBOX.") {
                    name.to_string()
                } else {
                    format!("INBOX.{name}")
                }
            }
        }
    }
}
