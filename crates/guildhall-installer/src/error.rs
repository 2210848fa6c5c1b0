use std::path::PathBuf;

use guildhall_common::Localization;
use guildhall_db::ScriptParseError;
use thiserror::Error;

use crate::APP_VERSION;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("database version {actual} is older than the required {minimum}")]
    VersionMismatch {
        actual: String,
        minimum: String,
        download_url: String,
    },

    #[error("sql script {file} not found in {}", dir.display())]
    ScriptNotFound { file: String, dir: PathBuf },

    #[error("failed to open sql script {}: {source}", path.display())]
    ScriptParse {
        path: PathBuf,
        #[source]
        source: ScriptParseError,
    },

    /// `index` is 1-based.
    #[error("statement {index} of {file} failed: {source}")]
    Statement {
        file: String,
        index: usize,
        #[source]
        source: guildhall_common::Error,
    },

    #[error(transparent)]
    Database(#[from] guildhall_common::Error),
}

impl InstallError {
    /// Text shown to the person running the installation.
    pub fn message(&self, l10n: &Localization) -> String {
        match self {
            Self::VersionMismatch {
                actual,
                minimum,
                download_url,
            } => {
                let link = format!("<a href=\"{download_url}\">");
                format!(
                    "{}: <strong>{actual}</strong><br /><br />{}",
                    l10n.get("SYS_DATABASE_VERSION", &[]),
                    l10n.get(
                        "INS_WRONG_MYSQL_VERSION",
                        &[APP_VERSION, minimum.as_str(), link.as_str(), "</a>"]
                    )
                )
            }
            Self::ScriptNotFound { file, dir } => l10n.get(
                "INS_DATABASE_FILE_NOT_FOUND",
                &[file.as_str(), dir.display().to_string().as_str()],
            ),
            Self::ScriptParse { path, .. } => {
                l10n.get("INS_ERROR_OPEN_FILE", &[path.display().to_string().as_str()])
            }
            Self::Statement {
                file,
                index,
                source,
            } => l10n.get(
                "INS_STATEMENT_FAILED",
                &[
                    index.to_string().as_str(),
                    file.as_str(),
                    source.to_string().as_str(),
                ],
            ),
            Self::Database(e) => e.to_string(),
        }
    }
}
