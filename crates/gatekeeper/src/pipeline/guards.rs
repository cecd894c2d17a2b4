//! Permission guards.
//!
//! Every guard lets server callers through and lets a user act on their own
//! data without a lookup. Otherwise the caller's record on the subject is
//! fetched and tested.

use gatekeeper_core::Permissions;
use tracing::debug;

use crate::auth::Identity;
use crate::broker::DataBroker;
use crate::error::ApiError;

/// Skips the lookup for callers whose access is known from identity alone.
fn implicit_access(caller: &Identity, subject_id: &str) -> bool {
    caller.is_server || caller.user_id == subject_id
}

fn deny(caller: &Identity, subject_id: &str, action: &str) -> ApiError {
    debug!(caller = %caller.user_id, subject = %subject_id, action, "Guard denied request");
    ApiError::Forbidden(format!("{} may not {action} {subject_id}", caller.user_id))
}

async fn caller_record(
    broker: &dyn DataBroker,
    caller: &Identity,
    subject_id: &str,
) -> Result<Option<Permissions>, ApiError> {
    Ok(broker.user_in_group(&caller.user_id, subject_id).await?)
}

/// Listing guard: the caller must administer the addressed user.
pub async fn require_custodian(
    broker: &dyn DataBroker,
    caller: &Identity,
    subject_id: &str,
) -> Result<(), ApiError> {
    if implicit_access(caller, subject_id) {
        return Ok(());
    }
    match caller_record(broker, caller, subject_id).await? {
        Some(record) if record.is_elevated() => Ok(()),
        _ => Err(deny(caller, subject_id, "list")),
    }
}

/// Read guard for the record (subject, grantee).
///
/// Elevated callers may read any record. A grantee may read their own
/// record unless it is an explicit empty one; a missing record is let
/// through so the lookup reports not-found.
pub async fn require_read(
    broker: &dyn DataBroker,
    caller: &Identity,
    subject_id: &str,
    grantee_id: &str,
) -> Result<(), ApiError> {
    if implicit_access(caller, subject_id) {
        return Ok(());
    }
    let record = caller_record(broker, caller, subject_id).await?;
    if record.as_ref().is_some_and(Permissions::is_elevated) {
        return Ok(());
    }
    if caller.user_id == grantee_id && record.is_none_or(|r| !r.is_empty()) {
        return Ok(());
    }
    Err(deny(caller, subject_id, "read"))
}

/// Write guard for the record (subject, grantee).
///
/// Elevated callers may write anything. Any other caller holding a
/// non-empty record on the subject may only submit the empty record.
pub async fn require_write(
    broker: &dyn DataBroker,
    caller: &Identity,
    subject_id: &str,
    body: &Permissions,
) -> Result<(), ApiError> {
    if implicit_access(caller, subject_id) {
        return Ok(());
    }
    match caller_record(broker, caller, subject_id).await? {
        Some(record) if record.is_elevated() => Ok(()),
        Some(record) if !record.is_empty() && body.is_empty() => Ok(()),
        _ => Err(deny(caller, subject_id, "write")),
    }
}
