use std::collections::HashMap;

use guildhall_common::{Error, OrgId, Result};
use tracing::debug;

use crate::database::{Database, SqlValue};

/// Organization preferences read from the `preferences` table.
#[derive(Debug, Clone, Default)]
pub struct SettingsManager {
    values: HashMap<String, String>,
}

impl SettingsManager {
    pub fn load(db: &dyn Database, org_id: OrgId) -> Result<Self> {
        let sql = format!(
            "SELECT prf_name, prf_value FROM {} WHERE prf_org_id = ?1",
            db.table("preferences")
        );
        let rows = db.get_array_from_sql(&sql, &[SqlValue::Integer(org_id.get())])?;

        let mut values = HashMap::with_capacity(rows.len());
        for row in rows {
            let Some(name) = row.get_str("prf_name") else {
                continue;
            };
            let value = match row.get("prf_value") {
                Some(SqlValue::Text(s)) => s.clone(),
                Some(SqlValue::Integer(i)) => i.to_string(),
                Some(SqlValue::Real(f)) => f.to_string(),
                _ => String::new(),
            };
            values.insert(name.to_string(), value);
        }
        debug!("loaded {} preferences for organization {org_id}", values.len());
        Ok(Self { values })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::NotFound(format!("preference {name}")))
    }

    /// Boolean preference. `1`/`true` are true, `0`/`false`/empty are false.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get_string(name)?.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(Error::Config(format!(
                "preference {name} is not a boolean: {other}"
            ))),
        }
    }
}
