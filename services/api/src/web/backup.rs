//! services/api/src/web/backup.rs
//!
//! JSON export and import of a user's reminders.

use crate::web::dto::{BackupMetadata, ImportResponse, ReminderBackup, ReminderDto};
use crate::web::rest::{handler_error, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use eyecare_core::ports::{PortError, ReminderRepository};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const BACKUP_VERSION: u32 = 1;

/// Builds the backup document for `reminders`.
pub fn backup_document(reminders: Vec<ReminderDto>) -> ReminderBackup {
    ReminderBackup {
        metadata: BackupMetadata {
            created_at: Utc::now(),
            version: BACKUP_VERSION,
            record_count: reminders.len(),
        },
        reminders,
    }
}

/// Download every reminder the caller owns as a JSON backup.
#[utoipa::path(
    get,
    path = "/reminders/export",
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Backup document", body = ReminderBackup),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn export_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let reminders = app_state
        .db
        .list_reminders(user_id)
        .await
        .map_err(|e| handler_error("Failed to export reminders", e))?;

    let document = backup_document(reminders.iter().map(ReminderDto::from).collect());
    info!(
        "Exported {} reminders for user {}",
        document.metadata.record_count, user_id
    );

    let filename = format!(
        "attachment; filename=\"reminders-{}.json\"",
        document.metadata.created_at.format("%Y-%m-%d")
    );
    Ok(([(header::CONTENT_DISPOSITION, filename)], Json(document)))
}

/// Restore reminders from a backup. Every record gets a fresh id; invalid records are skipped.
#[utoipa::path(
    post,
    path = "/reminders/import",
    request_body = ReminderBackup,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Import summary", body = ImportResponse),
        (status = 400, description = "Unsupported backup version"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn import_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(backup): Json<ReminderBackup>,
) -> Result<impl IntoResponse, HandlerError> {
    if backup.metadata.version > BACKUP_VERSION {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Unsupported backup version {}", backup.metadata.version),
        ));
    }

    let mut response = ImportResponse {
        imported: 0,
        skipped: 0,
    };

    for record in backup.reminders {
        let backup_id = record.id;
        let reminder = match record.into_domain(user_id, Uuid::new_v4()) {
            Ok(reminder) => reminder,
            Err(reason) => {
                warn!("Skipping backup record {}: {}", backup_id, reason);
                response.skipped += 1;
                continue;
            }
        };

        match app_state.reminders.create(reminder).await {
            Ok(_) => response.imported += 1,
            Err(PortError::Invalid(reason)) => {
                warn!("Skipping backup record {}: {}", backup_id, reason);
                response.skipped += 1;
            }
            Err(e) => return Err(handler_error("Failed to import reminders", e)),
        }
    }

    info!(
        "Imported {} reminders for user {} ({} skipped)",
        response.imported, user_id, response.skipped
    );
    Ok(Json(response))
}
