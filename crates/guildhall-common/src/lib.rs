pub mod error;
pub mod l10n;
pub mod types;

pub use error::{Error, Result};
pub use l10n::Localization;
pub use types::{OrgId, UserUuid};
