pub mod database;
pub mod profile_fields;
pub mod registration_store;
pub mod settings;
pub mod sql_script;
pub mod sqlite;

pub use database::{Database, DatabaseEngine, SqlRow, SqlValue};
pub use profile_fields::{DbProfileFields, ProfileFieldRegistry};
pub use registration_store::{RegistrationRecord, RegistrationStore};
pub use settings::SettingsManager;
pub use sql_script::{ScriptParseError, SqlScript};
pub use sqlite::SqliteDatabase;
