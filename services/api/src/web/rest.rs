//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the reminder REST endpoints and the master
//! definition for the OpenAPI document.

use crate::error::port_error_response;
use crate::web::dto::{
    BackupMetadata, EvaluatedReminderDto, ImportResponse, ListQuery, PriorityDto,
    RecurrencePatternDto, ReminderBackup, ReminderDto, ReminderInput, ReminderStatusDto,
    SnoozeRequest, ZoneQuery,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use eyecare_core::domain::{ProfileScope, ReminderFilter, StatusFilter};
use eyecare_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_reminders_handler,
        get_reminder_handler,
        create_reminder_handler,
        update_reminder_handler,
        delete_reminder_handler,
        snooze_reminder_handler,
        complete_reminder_handler,
        crate::web::backup::export_handler,
        crate::web::backup::import_handler,
    ),
    components(
        schemas(
            ReminderDto,
            EvaluatedReminderDto,
            ReminderInput,
            ReminderStatusDto,
            PriorityDto,
            RecurrencePatternDto,
            SnoozeRequest,
            ReminderBackup,
            BackupMetadata,
            ImportResponse,
        )
    ),
    tags(
        (name = "Eye Care Reminders API", description = "Reminder listing, snoozing and completion for family eye-health records.")
    )
)]
pub struct ApiDoc;

/// The error half of every handler's return type.
pub type HandlerError = (StatusCode, String);

pub(crate) fn handler_error(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::Unexpected(_) | PortError::Unavailable(_) => {
            error!("{}: {:?}", context, e);
        }
        _ => {}
    }
    port_error_response(&e)
}

fn bad_request(msg: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, msg.into())
}

fn filter_from_query(query: &ListQuery) -> Result<ReminderFilter, HandlerError> {
    let status = match query.status.as_deref() {
        Some(raw) => raw.parse::<StatusFilter>().map_err(bad_request)?,
        None => StatusFilter::All,
    };

    let profile = match (query.profile_id, query.general.unwrap_or(false)) {
        (Some(_), true) => {
            return Err(bad_request("profile_id and general cannot be combined"))
        }
        (Some(id), false) => Some(ProfileScope::Profile(id)),
        (None, true) => Some(ProfileScope::General),
        (None, false) => None,
    };

    Ok(ReminderFilter {
        status,
        query: query.q.clone(),
        profile,
    })
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's reminders, classified and sorted by due instant.
#[utoipa::path(
    get,
    path = "/reminders",
    params(
        ListQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Matching reminders", body = [EvaluatedReminderDto]),
        (status = 400, description = "Bad filter"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_reminders_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let filter = filter_from_query(&query)?;
    let zone = app_state
        .zone(query.utc_offset_minutes)
        .map_err(bad_request)?;
    let now = Utc::now().with_timezone(&zone);

    let reminders = app_state
        .reminders
        .list(user_id, &filter, &now)
        .await
        .map_err(|e| handler_error("Failed to list reminders", e))?;

    let body: Vec<EvaluatedReminderDto> =
        reminders.iter().map(EvaluatedReminderDto::from).collect();
    Ok(Json(body))
}

/// Fetch one reminder with its current classification.
#[utoipa::path(
    get,
    path = "/reminders/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder id"),
        ZoneQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "The reminder", body = EvaluatedReminderDto),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn get_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(reminder_id): Path<Uuid>,
    Query(query): Query<ZoneQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let zone = app_state
        .zone(query.utc_offset_minutes)
        .map_err(bad_request)?;
    let now = Utc::now().with_timezone(&zone);

    let evaluated = app_state
        .reminders
        .get(user_id, reminder_id, &now)
        .await
        .map_err(|e| handler_error("Failed to load reminder", e))?;
    Ok(Json(EvaluatedReminderDto::from(&evaluated)))
}

/// Create a reminder.
#[utoipa::path(
    post,
    path = "/reminders",
    request_body = ReminderInput,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 201, description = "Reminder created", body = ReminderDto),
        (status = 400, description = "Invalid reminder")
    )
)]
pub async fn create_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(input): Json<ReminderInput>,
) -> Result<impl IntoResponse, HandlerError> {
    let reminder = input
        .into_domain(user_id, Uuid::new_v4())
        .map_err(bad_request)?;

    let created = app_state
        .reminders
        .create(reminder)
        .await
        .map_err(|e| handler_error("Failed to create reminder", e))?;
    Ok((StatusCode::CREATED, Json(ReminderDto::from(&created))))
}

/// Replace a reminder's editable fields. Completion and snooze state are not touched.
#[utoipa::path(
    put,
    path = "/reminders/{id}",
    request_body = ReminderInput,
    params(
        ("id" = Uuid, Path, description = "Reminder id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Reminder updated", body = ReminderDto),
        (status = 400, description = "Invalid reminder"),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn update_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(reminder_id): Path<Uuid>,
    Json(input): Json<ReminderInput>,
) -> Result<impl IntoResponse, HandlerError> {
    let reminder = input
        .into_domain(user_id, reminder_id)
        .map_err(bad_request)?;

    let updated = app_state
        .reminders
        .update(reminder, Utc::now())
        .await
        .map_err(|e| handler_error("Failed to update reminder", e))?;
    Ok(Json(ReminderDto::from(&updated)))
}

/// Delete a reminder.
#[utoipa::path(
    delete,
    path = "/reminders/{id}",
    params(
        ("id" = Uuid, Path, description = "Reminder id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 204, description = "Reminder deleted"),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn delete_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(reminder_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .reminders
        .delete(user_id, reminder_id)
        .await
        .map_err(|e| handler_error("Failed to delete reminder", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Suppress a reminder's notifications for a number of minutes.
#[utoipa::path(
    post,
    path = "/reminders/{id}/snooze",
    request_body = SnoozeRequest,
    params(
        ("id" = Uuid, Path, description = "Reminder id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Reminder snoozed", body = ReminderDto),
        (status = 400, description = "Invalid duration or reminder already completed"),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn snooze_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(reminder_id): Path<Uuid>,
    Json(request): Json<SnoozeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let snoozed = app_state
        .reminders
        .snooze(user_id, reminder_id, request.minutes, Utc::now())
        .await
        .map_err(|e| handler_error("Failed to snooze reminder", e))?;
    Ok(Json(ReminderDto::from(&snoozed)))
}

/// Mark a reminder completed.
#[utoipa::path(
    post,
    path = "/reminders/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Reminder id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Reminder completed", body = ReminderDto),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn complete_reminder_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(reminder_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let completed = app_state
        .reminders
        .complete(user_id, reminder_id, Utc::now())
        .await
        .map_err(|e| handler_error("Failed to complete reminder", e))?;
    Ok(Json(ReminderDto::from(&completed)))
}
