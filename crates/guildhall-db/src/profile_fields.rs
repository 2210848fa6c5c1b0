use guildhall_common::{OrgId, Result};

use crate::database::{Database, SqlValue};

pub const LAST_NAME: &str = "LAST_NAME";
pub const FIRST_NAME: &str = "FIRST_NAME";
pub const EMAIL: &str = "EMAIL";

/// Maps a logical profile field name to its storage id for an organization.
pub trait ProfileFieldRegistry {
    /// `None` when the organization has no such field.
    fn resolve(&self, org_id: OrgId, logical_name: &str) -> Result<Option<i64>>;
}

/// Registry backed by the `user_fields` and `categories` tables. Fields in a
/// category without an organization are shared by all organizations; an
/// organization's own field wins over a shared one.
pub struct DbProfileFields<'a> {
    db: &'a dyn Database,
}

impl<'a> DbProfileFields<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }
}

impl ProfileFieldRegistry for DbProfileFields<'_> {
    fn resolve(&self, org_id: OrgId, logical_name: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT usf_id
               FROM {fields}
         INNER JOIN {categories}
                 ON cat_id = usf_cat_id
              WHERE usf_name_intern = ?1
                AND (cat_org_id = ?2 OR cat_org_id IS NULL)
           ORDER BY cat_org_id DESC
              LIMIT 1",
            fields = self.db.table("user_fields"),
            categories = self.db.table("categories"),
        );
        let rows = self.db.get_array_from_sql(
            &sql,
            &[
                SqlValue::Text(logical_name.to_string()),
                SqlValue::Integer(org_id.get()),
            ],
        )?;
        Ok(rows.first().and_then(|row| row.get_i64("usf_id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDatabase;

    fn seeded_db() -> SqliteDatabase {
        let db = SqliteDatabase::in_memory("adm").unwrap();
        for sql in [
            "CREATE TABLE adm_categories (cat_id INTEGER PRIMARY KEY, cat_org_id INTEGER)",
            "CREATE TABLE adm_user_fields (
                usf_id INTEGER PRIMARY KEY,
                usf_cat_id INTEGER NOT NULL,
                usf_name_intern TEXT NOT NULL
            )",
            "INSERT INTO adm_categories (cat_id, cat_org_id) VALUES (1, NULL), (2, 5)",
            "INSERT INTO adm_user_fields (usf_id, usf_cat_id, usf_name_intern) VALUES
                (10, 1, 'LAST_NAME'),
                (11, 1, 'FIRST_NAME'),
                (12, 1, 'EMAIL'),
                (42, 2, 'EMAIL')",
        ] {
            db.query_prepared(sql, &[]).unwrap();
        }
        db
    }

    #[test]
    fn resolves_shared_fields() {
        let db = seeded_db();
        let fields = DbProfileFields::new(&db);
        assert_eq!(fields.resolve(OrgId(1), LAST_NAME).unwrap(), Some(10));
        assert_eq!(fields.resolve(OrgId(1), EMAIL).unwrap(), Some(12));
    }

    #[test]
    fn organization_field_overrides_shared_field() {
        let db = seeded_db();
        let fields = DbProfileFields::new(&db);
        assert_eq!(fields.resolve(OrgId(5), EMAIL).unwrap(), Some(42));
        assert_eq!(fields.resolve(OrgId(5), FIRST_NAME).unwrap(), Some(11));
    }

    #[test]
    fn unknown_field_resolves_to_none() {
        let db = seeded_db();
        let fields = DbProfileFields::new(&db);
        assert_eq!(fields.resolve(OrgId(1), "BIRTHDAY").unwrap(), None);
    }
}
