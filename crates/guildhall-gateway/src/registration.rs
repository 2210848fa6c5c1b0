use std::fmt::Write;

use axum::Json;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, StatusCode, Version, header};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use guildhall_common::{Result, UserUuid};
use guildhall_db::{DbProfileFields, RegistrationRecord, RegistrationStore};
use guildhall_security::{InputValidator, encode_url};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::context::ModuleContext;
use crate::error::ApiResult;
use crate::state::SharedState;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M";

const PROFILE_PAGE: &str = "adm_program/modules/profile";
const POPUP_MESSAGE_PAGE: &str = "adm_program/system/popup_message";
const REGISTRATION_MODULE: &str = "adm_program/modules/registration";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "dataHref", skip_serializing_if = "Option::is_none")]
    pub data_href: Option<String>,
    pub icon: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardButton {
    pub url: String,
    pub name: String,
}

/// One pending registration as shown in the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationCard {
    pub id: String,
    pub title: String,
    /// HTML fragments; user supplied values inside are escaped.
    pub information: Vec<String>,
    pub actions: Vec<CardAction>,
    pub buttons: Vec<CardButton>,
}

/// What the registration page shows. `Empty` is a notice plus the location
/// the caller should send the user to instead of an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrationView {
    Empty {
        headline: String,
        message: String,
        forward_url: String,
    },
    Cards {
        headline: String,
        cards: Vec<RegistrationCard>,
    },
}

pub fn list_pending_registrations(ctx: &ModuleContext<'_>) -> Result<Vec<RegistrationRecord>> {
    let fields = DbProfileFields::new(ctx.db);
    RegistrationStore::new(ctx.db, &fields, ctx.org_id).list_pending()
}

pub fn render_registration_cards(
    records: &[RegistrationRecord],
    ctx: &ModuleContext<'_>,
) -> Result<RegistrationView> {
    let headline = ctx.l10n.get("SYS_REGISTRATION", &[]);

    if records.is_empty() {
        return Ok(RegistrationView::Empty {
            headline,
            message: ctx.l10n.get("SYS_NO_NEW_REGISTRATIONS", &[]),
            forward_url: home_url(ctx)?,
        });
    }

    let date_format = strftime_setting(ctx, "system_date", DEFAULT_DATE_FORMAT);
    let time_format = strftime_setting(ctx, "system_time", DEFAULT_TIME_FORMAT);

    let cards = records
        .iter()
        .map(|record| render_card(record, ctx, date_format, time_format))
        .collect::<Result<Vec<_>>>()?;

    Ok(RegistrationView::Cards { headline, cards })
}

fn render_card(
    record: &RegistrationRecord,
    ctx: &ModuleContext<'_>,
    date_format: &str,
    time_format: &str,
) -> Result<RegistrationCard> {
    let uuid = record.user_uuid.as_str();
    let row_id = format!("row_user_{uuid}");
    let full_name = format!("{} {}", record.first_name, record.last_name);

    let mut information = vec![
        ctx.l10n.get(
            "SYS_REGISTRATION_AT",
            &[
                format_timestamp(&record.registered_at, date_format, DEFAULT_DATE_FORMAT).as_str(),
                format_timestamp(&record.registered_at, time_format, DEFAULT_TIME_FORMAT).as_str(),
            ],
        ),
        format!(
            "{}: {}",
            ctx.l10n.get("SYS_USERNAME", &[]),
            InputValidator::escape_html(&record.login_name)
        ),
    ];
    if !record.email.is_empty() {
        let email = InputValidator::escape_html(&record.email);
        information.push(format!(
            "{}: <a href=\"mailto:{email}\">{email}</a>",
            ctx.l10n.get("SYS_EMAIL", &[])
        ));
    }

    let actions = vec![
        CardAction {
            url: Some(encode_url(&ctx.base_url, PROFILE_PAGE, &[("user_uuid", uuid)])?),
            data_href: None,
            icon: "fas fa-eye".to_string(),
            tooltip: ctx.l10n.get("SYS_SHOW_PROFILE", &[]),
        },
        CardAction {
            url: None,
            data_href: Some(encode_url(
                &ctx.base_url,
                POPUP_MESSAGE_PAGE,
                &[
                    ("type", "nwu"),
                    ("element_id", row_id.as_str()),
                    ("name", full_name.as_str()),
                    ("database_id", uuid),
                ],
            )?),
            icon: "fas fa-trash-alt".to_string(),
            tooltip: ctx.l10n.get("SYS_DELETE", &[]),
        },
    ];

    let buttons = vec![CardButton {
        url: encode_url(
            &ctx.base_url,
            &format!("{REGISTRATION_MODULE}/{uuid}/assign"),
            &[],
        )?,
        name: ctx.l10n.get("SYS_ASSIGN_REGISTRATION", &[]),
    }];

    Ok(RegistrationCard {
        id: row_id,
        title: full_name,
        information,
        actions,
        buttons,
    })
}

/// Configured home page below the base URL, or the base URL itself.
fn home_url(ctx: &ModuleContext<'_>) -> Result<String> {
    match ctx.settings.get_string("homepage") {
        Ok(path) if !path.is_empty() => encode_url(&ctx.base_url, path, &[]),
        _ => Ok(ctx.base_url.clone()),
    }
}

/// A strftime preference, or `default` when unset or not a valid format.
fn strftime_setting<'a>(ctx: &'a ModuleContext<'_>, name: &str, default: &'a str) -> &'a str {
    match ctx.settings.get_string(name) {
        Ok(format) if !StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) => {
            format
        }
        _ => default,
    }
}

/// Format `at` with `format`, falling back to `default` for specifiers a
/// timestamp without offset cannot render (`%z`, `%Z`).
fn format_timestamp(at: &NaiveDateTime, format: &str, default: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(format)).is_ok() {
        return out;
    }
    debug!("preference format {format:?} cannot render {at}, using {default:?}");
    out.clear();
    match write!(out, "{}", at.format(default)) {
        Ok(()) => out,
        Err(_) => at.to_string(),
    }
}

/// `GET /adm_program/modules/registration`
pub async fn list_handler(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    version: Version,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let ctx = ModuleContext::for_request(&state, &headers, &uri, version)?;
    let records = list_pending_registrations(&ctx)?;
    let view = render_registration_cards(&records, &ctx)?;

    let redirect = match &view {
        RegistrationView::Empty { forward_url, .. } => Some(forward_url.clone()),
        RegistrationView::Cards { .. } => None,
    };
    Ok(match redirect {
        Some(location) => (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, location)],
            Json(view),
        )
            .into_response(),
        None => Json(view).into_response(),
    })
}

/// `POST /adm_program/modules/registration/{uuid}/assign`
pub async fn assign_handler(
    State(state): State<SharedState>,
    Path(user_uuid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    InputValidator::validate_uuid(&user_uuid)?;
    let user_uuid = UserUuid::from_string(user_uuid);

    let db = state.db.as_ref();
    let fields = DbProfileFields::new(db);
    RegistrationStore::new(db, &fields, state.config.organization.id).approve(&user_uuid)?;

    Ok(Json(json!({ "status": "approved", "user_uuid": user_uuid })))
}

/// `DELETE /adm_program/modules/registration/{uuid}`
pub async fn delete_handler(
    State(state): State<SharedState>,
    Path(user_uuid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    InputValidator::validate_uuid(&user_uuid)?;
    let user_uuid = UserUuid::from_string(user_uuid);

    let db = state.db.as_ref();
    let fields = DbProfileFields::new(db);
    RegistrationStore::new(db, &fields, state.config.organization.id).delete(&user_uuid)?;

    Ok(Json(json!({ "status": "deleted", "user_uuid": user_uuid })))
}
