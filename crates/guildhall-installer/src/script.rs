use std::path::{Component, Path};

use guildhall_db::{Database, SqlScript};
use tracing::{info, warn};

use crate::error::InstallError;

/// Replay `file_name` from `scripts_dir` statement by statement.
///
/// Nothing touches the database unless the file exists and parses. Execution
/// stops at the first failing statement; statements before it stay applied.
/// Returns the number of statements executed.
pub fn apply_sql_script(
    db: &dyn Database,
    scripts_dir: &Path,
    file_name: &str,
) -> Result<usize, InstallError> {
    let not_found = || InstallError::ScriptNotFound {
        file: file_name.to_string(),
        dir: scripts_dir.to_path_buf(),
    };

    // Only plain file names; no traversal out of the scripts directory.
    let relative = Path::new(file_name);
    let mut components = relative.components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(not_found());
    }

    let path = scripts_dir.join(relative);
    if !path.is_file() {
        return Err(not_found());
    }

    let script = SqlScript::from_file(&path, db.table_prefix())
        .map_err(|source| InstallError::ScriptParse {
            path: path.clone(),
            source,
        })?;

    for (i, statement) in script.statements().iter().enumerate() {
        if let Err(source) = db.query_prepared(statement, &[]) {
            warn!(
                "statement {} of {} failed, aborting script: {source}",
                i + 1,
                script.name()
            );
            return Err(InstallError::Statement {
                file: script.name().to_string(),
                index: i + 1,
                source,
            });
        }
    }

    info!(
        "applied {} statements from {}",
        script.len(),
        path.display()
    );
    Ok(script.len())
}
