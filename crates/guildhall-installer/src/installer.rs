use std::path::PathBuf;

use guildhall_db::Database;
use serde::Serialize;
use tracing::info;

use crate::checks::{check_database_version, disable_soundex_search_if_unsupported};
use crate::error::InstallError;
use crate::script::apply_sql_script;

#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub file: String,
    pub statements: usize,
}

/// Outcome of a completed installation or update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub database_version: String,
    pub scripts: Vec<ScriptReport>,
    pub similar_search_disabled: bool,
}

/// Runs the installation/update sequence against one database:
/// version check, scripts in order, engine fixups. The first failure stops
/// the sequence and is returned; nothing is retried.
pub struct Installer<'a> {
    db: &'a dyn Database,
    scripts_dir: PathBuf,
    download_url: String,
}

impl<'a> Installer<'a> {
    pub fn new(db: &'a dyn Database, scripts_dir: PathBuf, download_url: impl Into<String>) -> Self {
        Self {
            db,
            scripts_dir,
            download_url: download_url.into(),
        }
    }

    pub fn check(&self) -> Result<String, InstallError> {
        check_database_version(self.db, &self.download_url)?;
        Ok(self.db.version()?)
    }

    /// Fresh installation from a single schema script.
    pub fn install(&self, script: &str) -> Result<UpdateReport, InstallError> {
        self.run(std::slice::from_ref(&script.to_string()))
    }

    /// Update by replaying `scripts` in the given order.
    pub fn update(&self, scripts: &[String]) -> Result<UpdateReport, InstallError> {
        self.run(scripts)
    }

    fn run(&self, scripts: &[String]) -> Result<UpdateReport, InstallError> {
        let database_version = self.check()?;

        let mut applied = Vec::with_capacity(scripts.len());
        for file in scripts {
            let statements = apply_sql_script(self.db, &self.scripts_dir, file)?;
            applied.push(ScriptReport {
                file: file.clone(),
                statements,
            });
        }

        let similar_search_disabled = disable_soundex_search_if_unsupported(self.db)?;
        info!(
            "database {database_version} up to date after {} script(s)",
            applied.len()
        );

        Ok(UpdateReport {
            database_version,
            scripts: applied,
            similar_search_disabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use guildhall_db::{DatabaseEngine, SqliteDatabase};

    use super::*;
    use crate::checks::tests::RecordingDb;

    fn scripts_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../installation/db_scripts")
    }

    #[test]
    fn install_runs_version_check_script_and_fixup() {
        let db = SqliteDatabase::in_memory("adm").unwrap();
        let installer = Installer::new(&db, scripts_dir(), "https://example.org/download");

        let report = installer.install("db.sql").unwrap();
        assert_eq!(report.scripts.len(), 1);
        assert_eq!(report.scripts[0].file, "db.sql");
        assert!(report.scripts[0].statements > 0);
        assert_eq!(report.database_version, db.version().unwrap());
    }

    #[test]
    fn too_old_engine_stops_before_any_script() {
        let mut db = RecordingDb::new(DatabaseEngine::Pgsql);
        db.version = "9.1".into();
        db.minimum = "9.6".into();
        let installer = Installer::new(&db, scripts_dir(), "https://example.org/download");

        let err = installer.update(&["db.sql".to_string()]).unwrap_err();
        assert!(matches!(err, InstallError::VersionMismatch { .. }));
        assert!(db.executed().is_empty());
    }

    #[test]
    fn missing_script_halts_the_update() {
        let db = RecordingDb::new(DatabaseEngine::Pgsql);
        let installer = Installer::new(&db, scripts_dir(), "https://example.org/download");

        let err = installer
            .update(&["does_not_exist.sql".to_string(), "db.sql".to_string()])
            .unwrap_err();
        assert!(matches!(err, InstallError::ScriptNotFound { .. }));
        // the soundex fixup never ran either
        assert!(db.executed().is_empty());
    }
}
