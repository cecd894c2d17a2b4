//! In-memory brokers for pipeline tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatekeeper_core::{GroupView, LifecycleError, Permissions, Scope};

use crate::auth::Identity;
use crate::broker::{BrokerError, DataBroker};

use super::Gatekeeper;

/// Records keyed by (grantee, subject). Unlike the SQLite broker it keeps
/// empty records when seeded directly, so guards can be tested against them.
#[derive(Default)]
pub struct MockBroker {
    records: Mutex<HashMap<(String, String), Permissions>>,
    lookups: Mutex<usize>,
}

impl MockBroker {
    pub fn with_record(self, grantee: &str, subject: &str, permissions: Permissions) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert((grantee.to_string(), subject.to_string()), permissions);
        self
    }

    pub fn record(&self, grantee: &str, subject: &str) -> Option<Permissions> {
        self.records
            .lock()
            .unwrap()
            .get(&(grantee.to_string(), subject.to_string()))
            .cloned()
    }

    /// Number of `user_in_group` calls so far.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    fn view(&self, own_id: &str, matches: impl Fn(&(String, String)) -> Option<String>) -> GroupView {
        let mut view = GroupView::new();
        view.insert(own_id.to_string(), Permissions::root());
        for (key, permissions) in self.records.lock().unwrap().iter() {
            if let Some(id) = matches(key) {
                view.insert(id, permissions.clone());
            }
        }
        view
    }
}

#[async_trait]
impl DataBroker for MockBroker {
    async fn groups_for_user(&self, user_id: &str) -> Result<GroupView, BrokerError> {
        Ok(self.view(user_id, |(grantee, subject)| {
            (grantee == user_id).then(|| subject.clone())
        }))
    }

    async fn users_in_group(&self, subject_id: &str) -> Result<GroupView, BrokerError> {
        Ok(self.view(subject_id, |(grantee, subject)| {
            (subject == subject_id).then(|| grantee.clone())
        }))
    }

    async fn user_in_group(
        &self,
        grantee_id: &str,
        subject_id: &str,
    ) -> Result<Option<Permissions>, BrokerError> {
        *self.lookups.lock().unwrap() += 1;
        if grantee_id == subject_id {
            return Ok(Some(Permissions::root()));
        }
        Ok(self.record(grantee_id, subject_id))
    }

    async fn set_permissions(
        &self,
        grantee_id: &str,
        subject_id: &str,
        permissions: &Permissions,
    ) -> Result<(), BrokerError> {
        let key = (grantee_id.to_string(), subject_id.to_string());
        let mut records = self.records.lock().unwrap();
        if permissions.is_empty() {
            records.remove(&key);
        } else {
            records.insert(key, permissions.clone());
        }
        Ok(())
    }
}

/// Fails every call as if the store were shutting down.
pub struct FailingBroker;

#[async_trait]
impl DataBroker for FailingBroker {
    async fn groups_for_user(&self, _user_id: &str) -> Result<GroupView, BrokerError> {
        Err(LifecycleError::Closing.into())
    }

    async fn users_in_group(&self, _subject_id: &str) -> Result<GroupView, BrokerError> {
        Err(LifecycleError::Closing.into())
    }

    async fn user_in_group(
        &self,
        _grantee_id: &str,
        _subject_id: &str,
    ) -> Result<Option<Permissions>, BrokerError> {
        Err(LifecycleError::Closing.into())
    }

    async fn set_permissions(
        &self,
        _grantee_id: &str,
        _subject_id: &str,
        _permissions: &Permissions,
    ) -> Result<(), BrokerError> {
        Err(LifecycleError::Closing.into())
    }
}

pub fn scopes(scopes: &[Scope]) -> Permissions {
    Permissions::with_scopes(scopes)
}

pub fn user(id: &str) -> Identity {
    Identity::user(id)
}

pub fn gatekeeper(broker: MockBroker) -> (Gatekeeper, Arc<MockBroker>) {
    let broker = Arc::new(broker);
    (Gatekeeper::new(Arc::clone(&broker) as Arc<dyn DataBroker>), broker)
}
