//! Data broker: the permission store seen by the authorization pipeline.

pub mod queries;
pub mod store;


use async_trait::async_trait;
use gatekeeper_core::db::DatabaseError;
use gatekeeper_core::{GroupView, LifecycleError, Permissions};

pub use store::StoreBroker;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Store unavailable: {0}")]
    Store(#[from] LifecycleError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Corrupt permission record: {0}")]
    Corrupt(String),
}

/// Read and write access to permission records.
///
/// A record is keyed by (grantee, subject): the scopes `grantee` holds over
/// `subject`'s data. Every user implicitly holds `root` over themselves.
#[async_trait]
pub trait DataBroker: Send + Sync {
    /// Every subject `user_id` holds scopes over, keyed by subject.
    async fn groups_for_user(&self, user_id: &str) -> Result<GroupView, BrokerError>;

    /// Every grantee holding scopes over `subject_id`, keyed by grantee.
    async fn users_in_group(&self, subject_id: &str) -> Result<GroupView, BrokerError>;

    /// The scopes `grantee_id` holds over `subject_id`, if any.
    async fn user_in_group(
        &self,
        grantee_id: &str,
        subject_id: &str,
    ) -> Result<Option<Permissions>, BrokerError>;

    /// Replace the record for (grantee, subject). An empty record deletes it.
    async fn set_permissions(
        &self,
        grantee_id: &str,
        subject_id: &str,
        permissions: &Permissions,
    ) -> Result<(), BrokerError>;
}
