use chrono::NaiveDateTime;
use guildhall_common::{Error, OrgId, Result, UserUuid};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::{Database, SqlRow, SqlValue};
use crate::profile_fields::{EMAIL, FIRST_NAME, LAST_NAME, ProfileFieldRegistry};

/// Storage format of `reg_timestamp`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A self-registration that an administrator has not yet approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub user_id: i64,
    pub user_uuid: UserUuid,
    pub login_name: String,
    pub registered_at: NaiveDateTime,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

/// Pending registrations of one organization.
pub struct RegistrationStore<'a> {
    db: &'a dyn Database,
    fields: &'a dyn ProfileFieldRegistry,
    org_id: OrgId,
}

impl<'a> RegistrationStore<'a> {
    pub fn new(db: &'a dyn Database, fields: &'a dyn ProfileFieldRegistry, org_id: OrgId) -> Self {
        Self { db, fields, org_id }
    }

    /// All registrations of unvalidated users, ordered by last name then
    /// first name.
    pub fn list_pending(&self) -> Result<Vec<RegistrationRecord>> {
        let sql = format!(
            "SELECT usr_id AS userID, usr_uuid AS userUUID, usr_login_name AS loginName,
                    reg_timestamp AS registrationTimestamp,
                    last_name.usd_value AS lastName, first_name.usd_value AS firstName,
                    email.usd_value AS email
               FROM {registrations}
         INNER JOIN {users}
                 ON usr_id = reg_usr_id
          LEFT JOIN {user_data} AS last_name
                 ON last_name.usd_usr_id = usr_id
                AND last_name.usd_usf_id = ?1
          LEFT JOIN {user_data} AS first_name
                 ON first_name.usd_usr_id = usr_id
                AND first_name.usd_usf_id = ?2
          LEFT JOIN {user_data} AS email
                 ON email.usd_usr_id = usr_id
                AND email.usd_usf_id = ?3
              WHERE usr_valid = 0
                AND reg_org_id = ?4
           ORDER BY lastName, firstName",
            registrations = self.db.table("registrations"),
            users = self.db.table("users"),
            user_data = self.db.table("user_data"),
        );

        let params = [
            self.field_param(LAST_NAME)?,
            self.field_param(FIRST_NAME)?,
            self.field_param(EMAIL)?,
            SqlValue::Integer(self.org_id.get()),
        ];
        self.db
            .get_array_from_sql(&sql, &params)?
            .iter()
            .map(record_from_row)
            .collect()
    }

    pub fn pending_count(&self) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) AS pending
               FROM {registrations}
         INNER JOIN {users}
                 ON usr_id = reg_usr_id
              WHERE usr_valid = 0
                AND reg_org_id = ?1",
            registrations = self.db.table("registrations"),
            users = self.db.table("users"),
        );
        let rows = self
            .db
            .get_array_from_sql(&sql, &[SqlValue::Integer(self.org_id.get())])?;
        Ok(rows
            .first()
            .and_then(|row| row.get_i64("pending"))
            .unwrap_or(0) as usize)
    }

    /// Accept a pending registration: the user becomes valid and the
    /// registration row is removed, so it drops out of `list_pending`.
    /// Both changes land together or not at all.
    pub fn approve(&self, user_uuid: &UserUuid) -> Result<()> {
        self.db.transaction(&mut |db| {
            let user_id = self.pending_user_id(db, user_uuid)?;
            db.query_prepared(
                &format!(
                    "UPDATE {} SET usr_valid = 1 WHERE usr_id = ?1",
                    db.table("users")
                ),
                &[SqlValue::Integer(user_id)],
            )?;
            self.delete_registration_row(db, user_id)
        })?;

        info!("approved registration of user {user_uuid} for organization {}", self.org_id);
        Ok(())
    }

    /// Reject a pending registration. The user and their profile data are
    /// removed once no other organization holds a registration for them.
    pub fn delete(&self, user_uuid: &UserUuid) -> Result<()> {
        self.db.transaction(&mut |db| {
            let user_id = self.pending_user_id(db, user_uuid)?;
            self.delete_registration_row(db, user_id)?;

            let remaining = db.get_array_from_sql(
                &format!(
                    "SELECT reg_id FROM {} WHERE reg_usr_id = ?1",
                    db.table("registrations")
                ),
                &[SqlValue::Integer(user_id)],
            )?;
            if remaining.is_empty() {
                db.query_prepared(
                    &format!("DELETE FROM {} WHERE usd_usr_id = ?1", db.table("user_data")),
                    &[SqlValue::Integer(user_id)],
                )?;
                db.query_prepared(
                    &format!("DELETE FROM {} WHERE usr_id = ?1", db.table("users")),
                    &[SqlValue::Integer(user_id)],
                )?;
            }
            Ok(())
        })?;

        info!("deleted registration of user {user_uuid} for organization {}", self.org_id);
        Ok(())
    }

    fn pending_user_id(&self, db: &dyn Database, user_uuid: &UserUuid) -> Result<i64> {
        let sql = format!(
            "SELECT usr_id
               FROM {registrations}
         INNER JOIN {users}
                 ON usr_id = reg_usr_id
              WHERE usr_uuid = ?1
                AND usr_valid = 0
                AND reg_org_id = ?2",
            registrations = db.table("registrations"),
            users = db.table("users"),
        );
        let rows = db.get_array_from_sql(
            &sql,
            &[
                SqlValue::Text(user_uuid.as_str().to_string()),
                SqlValue::Integer(self.org_id.get()),
            ],
        )?;
        rows.first()
            .and_then(|row| row.get_i64("usr_id"))
            .ok_or_else(|| Error::NotFound(format!("pending registration for user {user_uuid}")))
    }

    fn delete_registration_row(&self, db: &dyn Database, user_id: i64) -> Result<()> {
        db.query_prepared(
            &format!(
                "DELETE FROM {} WHERE reg_usr_id = ?1 AND reg_org_id = ?2",
                db.table("registrations")
            ),
            &[SqlValue::Integer(user_id), SqlValue::Integer(self.org_id.get())],
        )?;
        Ok(())
    }

    fn field_param(&self, logical_name: &str) -> Result<SqlValue> {
        Ok(match self.fields.resolve(self.org_id, logical_name)? {
            Some(id) => SqlValue::Integer(id),
            None => SqlValue::Null,
        })
    }
}

fn record_from_row(row: &SqlRow) -> Result<RegistrationRecord> {
    let user_id = row
        .get_i64("userID")
        .ok_or_else(|| Error::Database("registration row without user id".into()))?;
    let raw_timestamp = row.get_str("registrationTimestamp").unwrap_or_default();
    let registered_at = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| {
            Error::Database(format!(
                "invalid registration timestamp {raw_timestamp:?} for user {user_id}: {e}"
            ))
        })?;

    Ok(RegistrationRecord {
        user_id,
        user_uuid: UserUuid::from_string(row.get_str("userUUID").unwrap_or_default()),
        login_name: row.get_str("loginName").unwrap_or_default().to_string(),
        registered_at,
        last_name: row.get_str("lastName").unwrap_or_default().to_string(),
        first_name: row.get_str("firstName").unwrap_or_default().to_string(),
        email: row.get_str("email").unwrap_or_default().to_string(),
    })
}
