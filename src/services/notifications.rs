use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Notification, StaffRole};
use crate::store::Datastore;

/// Fire-and-forget notification side channel. Core operations call `notify`
/// after committing a change; nothing downstream depends on delivery.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<Datastore>,
}

impl NotificationService {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, message))]
    pub fn notify(
        &self,
        title: &str,
        message: &str,
        bill_number: Option<String>,
        recipient_role: Option<StaffRole>,
        recipient_id: Option<String>,
    ) {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: title.to_string(),
            message: message.to_string(),
            bill_number,
            recipient_role,
            recipient_id,
            read: false,
            created_at: Utc::now(),
        };
        debug!(title, "notification queued");
        self.store.append_notification(notification);
    }

    /// Notifications targeting the given account, newest first.
    pub fn for_account(&self, account_id: &str) -> Result<Vec<Notification>, ServiceError> {
        let account = self
            .store
            .accounts
            .get(account_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {account_id} not found")))?;
        let role = account.role;
        drop(account);

        let mut list: Vec<Notification> = self
            .store
            .notifications_snapshot()
            .into_iter()
            .filter(|n| n.targets(account_id, role))
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    pub fn unread_count(&self, account_id: &str) -> Result<usize, ServiceError> {
        Ok(self
            .for_account(account_id)?
            .into_iter()
            .filter(|n| !n.read)
            .count())
    }

    pub fn mark_read(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.store.mark_notification_read(id) {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("notification {id} not found")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::account;

    #[test]
    fn targeting_by_role_and_id() {
        let store = Arc::new(Datastore::new());
        let svc = NotificationService::new(store.clone());
        store
            .accounts
            .insert("CUT001".into(), account("CUT001", StaffRole::Cutting));
        store
            .accounts
            .insert("STC001".into(), account("STC001", StaffRole::Stitching));

        svc.notify("Ready for Cutting", "Bill ready", Some("ORD-1".into()), Some(StaffRole::Cutting), None);
        svc.notify("Direct", "For you", None, None, Some("STC001".into()));

        assert_eq!(svc.for_account("CUT001").unwrap().len(), 1);
        assert_eq!(svc.for_account("STC001").unwrap().len(), 1);
        assert_eq!(svc.unread_count("CUT001").unwrap(), 1);

        let id = svc.for_account("CUT001").unwrap()[0].id;
        svc.mark_read(id).unwrap();
        assert_eq!(svc.unread_count("CUT001").unwrap(), 0);
    }
}
