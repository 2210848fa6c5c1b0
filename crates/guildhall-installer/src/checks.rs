use guildhall_db::{Database, DatabaseEngine, SqlValue};
use tracing::{debug, info};

use crate::error::InstallError;
use crate::version::DatabaseVersion;

/// Fail with `VersionMismatch` when the connected engine is older than the
/// minimum the schema needs. Reads only.
pub fn check_database_version(db: &dyn Database, download_url: &str) -> Result<(), InstallError> {
    let actual = db.version()?;
    let minimum = db.minimum_required_version();

    let mismatch = || InstallError::VersionMismatch {
        actual: actual.clone(),
        minimum: minimum.clone(),
        download_url: download_url.to_string(),
    };
    let actual_version: DatabaseVersion = actual.parse().map_err(|_| mismatch())?;
    let minimum_version: DatabaseVersion = minimum.parse().map_err(|_| mismatch())?;

    if actual_version < minimum_version {
        return Err(mismatch());
    }
    debug!(
        "{} version {actual} satisfies minimum {minimum}",
        db.engine().as_str()
    );
    Ok(())
}

/// Turn off the similar-name search when the engine has no `soundex`
/// function. PostgreSQL never ships it by default; other engines are probed.
///
/// Returns whether the preference was written. Running it again leaves the
/// same state.
pub fn disable_soundex_search_if_unsupported(db: &dyn Database) -> Result<bool, InstallError> {
    let supported = match db.engine() {
        DatabaseEngine::Pgsql => false,
        _ => db.has_function("soundex")?,
    };
    if supported {
        return Ok(false);
    }

    let sql = format!(
        "UPDATE {} SET prf_value = ?1 WHERE prf_name = 'system_search_similar'",
        db.table("preferences")
    );
    db.query_prepared(&sql, &[SqlValue::Text("0".into())])?;
    info!(
        "soundex is not available on {}, disabled similar-name search",
        db.engine().as_str()
    );
    Ok(true)
}
