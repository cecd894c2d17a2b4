//! The Gatekeeper operations exposed to the router.

use std::sync::Arc;

use tracing::info;

use super::outcome::{self, Outcome};
use super::{body, guards};
use crate::auth::Identity;
use crate::broker::DataBroker;
use crate::error::ApiError;

#[derive(Clone)]
pub struct Gatekeeper {
    broker: Arc<dyn DataBroker>,
}

impl Gatekeeper {
    pub fn new(broker: Arc<dyn DataBroker>) -> Self {
        Self { broker }
    }

    /// Who can access `subject_id`, keyed by grantee.
    pub async fn list_groups_for_subject(
        &self,
        caller: &Identity,
        subject_id: &str,
    ) -> Result<Outcome, ApiError> {
        guards::require_custodian(self.broker.as_ref(), caller, subject_id).await?;
        let view = self.broker.users_in_group(subject_id).await?;
        outcome::found(Some(view))
    }

    /// Whose data `user_id` can access, keyed by subject.
    pub async fn list_groups_for_grantee(
        &self,
        caller: &Identity,
        user_id: &str,
    ) -> Result<Outcome, ApiError> {
        guards::require_custodian(self.broker.as_ref(), caller, user_id).await?;
        let view = self.broker.groups_for_user(user_id).await?;
        outcome::found(Some(view))
    }

    pub async fn get_permission(
        &self,
        caller: &Identity,
        subject_id: &str,
        grantee_id: &str,
    ) -> Result<Outcome, ApiError> {
        guards::require_read(self.broker.as_ref(), caller, subject_id, grantee_id).await?;
        let record = self.broker.user_in_group(grantee_id, subject_id).await?;
        outcome::found(record)
    }

    /// Write (or, for an empty body, delete) the record and return the
    /// record as stored afterwards.
    pub async fn set_permission(
        &self,
        caller: &Identity,
        subject_id: &str,
        grantee_id: &str,
        raw_body: &[u8],
    ) -> Result<Outcome, ApiError> {
        let permissions = body::normalize(raw_body)?;
        guards::require_write(self.broker.as_ref(), caller, subject_id, &permissions).await?;
        if grantee_id == subject_id {
            return Err(ApiError::BadRequest(
                "a user's access to their own data cannot be changed".to_string(),
            ));
        }

        self.broker
            .set_permissions(grantee_id, subject_id, &permissions)
            .await?;
        info!(
            caller = %caller.user_id,
            subject = %subject_id,
            grantee = %grantee_id,
            scopes = ?permissions.scopes(),
            "Permissions updated"
        );

        let record = self.broker.user_in_group(grantee_id, subject_id).await?;
        outcome::written(record)
    }
}
