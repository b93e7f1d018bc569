//! Address-book contacts

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use shared_types::Contact;
use uuid::Uuid;

use super::{require, validate_email};
use crate::auth::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ContactListResponse, ContactResponse, CreateContactRequest};
use crate::state::AppState;

/// Create a contact in the caller's address book
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    require(&req.name, "name")?;
    validate_email(&req.email)?;

    if db::find_contact_by_email(&state.db, &user.id, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "A contact with email {} already exists",
            req.email.trim()
        )));
    }

    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone,
        company: req.company,
        user_role: req.user_role,
        created_by: user.id.clone(),
        created_at: Utc::now(),
    };
    db::insert_contact(&state.db, &contact).await?;

    tracing::info!(contact_id = %contact.id, owner = %user.id, role = contact.user_role.as_str(), "Created contact");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            contact,
        }),
    ))
}

/// List the caller's contacts, oldest first
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ContactListResponse>> {
    let contacts = db::list_contacts(&state.db, &user.id).await?;
    Ok(Json(ContactListResponse {
        success: true,
        contacts,
    }))
}

/// The caller's own contact, created on first use, used for self-signing
pub(crate) async fn own_contact(state: &AppState, user: &AuthUser) -> ApiResult<Contact> {
    if let Some(contact) = db::find_contact_by_email(&state.db, &user.id, &user.email).await? {
        return Ok(contact);
    }

    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        name: user.name.clone(),
        email: user.email.trim().to_string(),
        phone: None,
        company: None,
        user_role: shared_types::UserRole::Signer,
        created_by: user.id.clone(),
        created_at: Utc::now(),
    };
    db::insert_contact(&state.db, &contact).await?;
    tracing::info!(contact_id = %contact.id, owner = %user.id, "Created self-sign contact");
    Ok(contact)
}
