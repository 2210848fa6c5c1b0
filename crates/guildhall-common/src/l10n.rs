use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Built-in English texts. `#VARn#` is replaced by the n-th argument,
/// `#VARn_BOLD#` by the same argument wrapped in `<strong>`.
const DEFAULT_CATALOG: &[(&str, &str)] = &[
    ("SYS_DATABASE_VERSION", "Database version"),
    (
        "INS_WRONG_MYSQL_VERSION",
        "Guildhall #VAR1# requires database version #VAR2# or higher. \
         Please update your database or download a compatible release from the \
         #VAR3#download page#VAR4#.",
    ),
    (
        "INS_DATABASE_FILE_NOT_FOUND",
        "The file #VAR1_BOLD# could not be found in folder #VAR2_BOLD#.",
    ),
    ("INS_ERROR_OPEN_FILE", "The file #VAR1_BOLD# could not be opened."),
    (
        "INS_STATEMENT_FAILED",
        "Statement #VAR1# of file #VAR2_BOLD# could not be executed: #VAR3#",
    ),
    ("SYS_REGISTRATION", "Registration"),
    ("SYS_NO_NEW_REGISTRATIONS", "There are no new registrations."),
    ("SYS_REGISTRATION_AT", "Registered on #VAR1# at #VAR2#"),
    ("SYS_USERNAME", "Username"),
    ("SYS_EMAIL", "Email"),
    ("SYS_SHOW_PROFILE", "Show profile"),
    ("SYS_DELETE", "Delete"),
    ("SYS_ASSIGN_REGISTRATION", "Assign registration"),
];

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#VAR(\d+)(_BOLD)?#").unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

/// Message catalog keyed by message identifiers.
#[derive(Debug, Clone)]
pub struct Localization {
    texts: HashMap<String, String>,
}

impl Localization {
    /// Catalog holding only the built-in English texts.
    pub fn builtin() -> Self {
        let texts = DEFAULT_CATALOG
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { texts }
    }

    /// Built-in texts overridden by the entries of a YAML map file.
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let overrides: HashMap<String, String> = serde_yaml::from_str(&contents)
            .map_err(|e| Error::Localization(format!("{}: {e}", path.display())))?;

        let mut catalog = Self::builtin();
        info!(
            "loaded {} message overrides from {}",
            overrides.len(),
            path.display()
        );
        catalog.texts.extend(overrides);
        Ok(catalog)
    }

    /// Look up `key` and substitute the placeholders with `args`.
    /// An unknown key yields the key itself so missing texts stay visible.
    pub fn get(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.texts.get(key) else {
            debug!("missing message text for {key}");
            return key.to_string();
        };

        // One pass over the template, so placeholders inside arguments stay.
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let arg = caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| args.get(i));
                match (arg, caps.get(2)) {
                    (Some(arg), Some(_)) => format!("<strong>{arg}</strong>"),
                    (Some(arg), None) => (*arg).to_string(),
                    (None, _) => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl Default for Localization {
    fn default() -> Self {
        Self::builtin()
    }
}
