//! [`DataBroker`] over the managed SQLite store.

use std::sync::Arc;

use async_trait::async_trait;
use gatekeeper_core::sqlite::PERMISSIONS;
use gatekeeper_core::{ConnectionManager, GroupView, Permissions, SqliteConnector};
use tracing::debug;

use super::{BrokerError, DataBroker, queries};

/// Runs every query through the connection manager so that each one is
/// counted as in flight while the store drains.
#[derive(Clone)]
pub struct StoreBroker {
    store: Arc<ConnectionManager<SqliteConnector>>,
}

impl StoreBroker {
    pub const fn new(store: Arc<ConnectionManager<SqliteConnector>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DataBroker for StoreBroker {
    async fn groups_for_user(&self, user_id: &str) -> Result<GroupView, BrokerError> {
        let rows = self
            .store
            .with_resource(PERMISSIONS, |collection, mut done| async move {
                let rows = queries::list_for_grantee(collection.pool(), user_id).await;
                done.signal();
                rows
            })
            .await??;
        queries::group_view(&rows, user_id, |row| &row.subject_id)
    }

    async fn users_in_group(&self, subject_id: &str) -> Result<GroupView, BrokerError> {
        let rows = self
            .store
            .with_resource(PERMISSIONS, |collection, mut done| async move {
                let rows = queries::list_for_subject(collection.pool(), subject_id).await;
                done.signal();
                rows
            })
            .await??;
        queries::group_view(&rows, subject_id, |row| &row.grantee_id)
    }

    async fn user_in_group(
        &self,
        grantee_id: &str,
        subject_id: &str,
    ) -> Result<Option<Permissions>, BrokerError> {
        if grantee_id == subject_id {
            return Ok(Some(Permissions::root()));
        }
        let row = self
            .store
            .with_resource(PERMISSIONS, |collection, mut done| async move {
                let row = queries::get_record(collection.pool(), grantee_id, subject_id).await;
                done.signal();
                row
            })
            .await??;
        row.map(|row| row.decode()).transpose()
    }

    async fn set_permissions(
        &self,
        grantee_id: &str,
        subject_id: &str,
        permissions: &Permissions,
    ) -> Result<(), BrokerError> {
        let encoded = if permissions.is_empty() {
            None
        } else {
            Some(
                permissions
                    .to_json()
                    .map_err(|e| BrokerError::Corrupt(e.to_string()))?,
            )
        };

        self.store
            .with_resource(PERMISSIONS, |collection, mut done| async move {
                let result = match encoded {
                    Some(encoded) => {
                        queries::upsert_record(collection.pool(), grantee_id, subject_id, &encoded)
                            .await
                    }
                    None => queries::delete_record(collection.pool(), grantee_id, subject_id)
                        .await
                        .map(|removed| {
                            debug!(grantee_id, subject_id, removed, "Permission record cleared");
                        }),
                };
                done.signal();
                result
            })
            .await??;
        Ok(())
    }
}
