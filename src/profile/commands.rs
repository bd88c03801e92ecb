//! Profile commands
//! 1. signup
//! 2. allow-listed field update
// region:    --- Imports
use super::model::{ProfileField, UserProfile};
use crate::auction::events::GalleryEvent;
use crate::database::DatabaseManager;
use crate::error::{GalleryError, GalleryResult};
use crate::event_store::{append_event, publish_committed, EventPublisher};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SignupCommand {
    pub email: String,
    pub name: Option<String>,
    pub shipping_address: Option<String>,
}

impl SignupCommand {
    fn validate(&self) -> GalleryResult<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(GalleryError::Validation(
                "A valid email address is required.".into(),
            ));
        }
        for value in [&self.name, &self.shipping_address].into_iter().flatten() {
            if value.chars().count() > 255 {
                return Err(GalleryError::Validation(
                    "Profile fields are limited to 255 characters.".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateProfileCommand {
    pub field: String,
    pub value: String,
}

/// Reply shape of a successful field update
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProfileFieldUpdated {
    pub status: String,
    pub field: String,
    pub new_value: String,
}

/// 1. signup
pub async fn handle_signup(
    cmd: SignupCommand,
    db_manager: &DatabaseManager,
) -> GalleryResult<UserProfile> {
    info!("{:<12} --> Signup: {}", "Command", cmd.email);
    cmd.validate()?;

    let profile = sqlx::query_as::<_, UserProfile>(
        "INSERT INTO user_profiles (email, name, shipping_address, create_date)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING
         RETURNING *",
    )
    .bind(cmd.email.trim())
    .bind(&cmd.name)
    .bind(&cmd.shipping_address)
    .bind(Utc::now())
    .fetch_optional(db_manager.pool())
    .await?
    .ok_or_else(|| GalleryError::Conflict("An account with this email already exists.".into()))?;

    Ok(profile)
}

/// 2. allow-listed field update
pub async fn handle_update_profile(
    profile_id: i64,
    cmd: UpdateProfileCommand,
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
) -> GalleryResult<ProfileFieldUpdated> {
    info!(
        "{:<12} --> Profile {} field update: {}",
        "Command", profile_id, cmd.field
    );
    let field = ProfileField::from_name(&cmd.field)
        .ok_or_else(|| GalleryError::InvalidField(cmd.field.clone()))?;
    if cmd.value.chars().count() > 255 {
        return Err(GalleryError::Validation(
            "Profile fields are limited to 255 characters.".into(),
        ));
    }

    let mut tx = db_manager.pool().begin().await?;

    let profile = sqlx::query_as::<_, UserProfile>(field.update_sql())
        .bind(&cmd.value)
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GalleryError::NotFound {
            entity: "Profile",
            id: profile_id,
        })?;

    let event = append_event(
        &mut tx,
        &GalleryEvent::ProfileUpdated {
            profile_id,
            email: profile.email.clone(),
            field: field.as_str().to_string(),
            new_value: cmd.value.clone(),
            timestamp: Utc::now(),
        },
    )
    .await?;

    tx.commit().await?;
    publish_committed(publisher, &[event]).await;

    Ok(ProfileFieldUpdated {
        status: "success".into(),
        field: field.as_str().to_string(),
        new_value: cmd.value,
    })
}
// endregion: --- Commands

// region:    --- Helpers
/// Load a profile and require the staff flag
pub async fn require_staff(conn: &mut PgConnection, profile_id: i64) -> GalleryResult<UserProfile> {
    let profile = load_profile(conn, profile_id).await?;
    if !profile.is_staff {
        return Err(GalleryError::Forbidden(
            "Only staff members can perform this action.".into(),
        ));
    }
    Ok(profile)
}

pub async fn load_profile(conn: &mut PgConnection, profile_id: i64) -> GalleryResult<UserProfile> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GalleryError::NotFound {
            entity: "Profile",
            id: profile_id,
        })
}
// endregion: --- Helpers
