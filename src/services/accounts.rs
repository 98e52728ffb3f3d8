use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::rates::MAX_REFERRAL_DEPTH;
use crate::models::{Account, ManagerRank, StaffRole};
use crate::store::Datastore;

const DEFAULT_PASSWORD: &str = "123456";
const DEFAULT_WALLET_PIN: &str = "1234";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, message = "Account id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 10, max = 10, message = "Mobile must be 10 digits"))]
    pub mobile: String,
    pub email: Option<String>,
    pub role: StaffRole,
    pub password: Option<String>,
    pub referred_by: Option<String>,
    pub wallet_pin: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    #[validate(length(min = 10, max = 10, message = "Mobile must be 10 digits"))]
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub referred_by: Option<String>,
    #[validate(length(min = 4, max = 4, message = "Wallet PIN must be 4 digits"))]
    pub wallet_pin: Option<String>,
    pub manager_rank: Option<ManagerRank>,
}

/// Rank progress snapshot for a showroom manager.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ManagerStats {
    pub current_rank: ManagerRank,
    /// Rank the current showroom count qualifies for, if any.
    pub earned_rank: Option<ManagerRank>,
    pub referred_showrooms: usize,
}

/// Staff directory: registration, profile edits, the login gate, and the
/// referral-edge validation that keeps the upline graph a forest.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<Datastore>,
    event_sender: EventSender,
}

impl AccountService {
    pub fn new(store: Arc<Datastore>, event_sender: EventSender) -> Self {
        Self { store, event_sender }
    }

    #[instrument(skip(self, request), fields(account_id = %request.id, role = %request.role))]
    pub fn create(&self, request: CreateAccountRequest) -> Result<Account, ServiceError> {
        request.validate()?;
        if self.store.accounts.contains_key(&request.id) {
            return Err(ServiceError::ValidationError(format!(
                "account {} already exists",
                request.id
            )));
        }
        if let Some(referrer) = &request.referred_by {
            self.validate_referral_edge(&request.id, referrer)?;
        }

        let account = Account {
            id: request.id.clone(),
            name: request.name,
            mobile: request.mobile,
            email: request.email,
            role: request.role,
            password: request.password.unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            referred_by: request.referred_by,
            total_referral_earnings: Decimal::ZERO,
            claimed_referral_earnings: Decimal::ZERO,
            wallet_pin: Some(request.wallet_pin.unwrap_or_else(|| DEFAULT_WALLET_PIN.to_string())),
            manager_rank: (request.role == StaffRole::Manager).then_some(ManagerRank::Associate),
            active: true,
            created_at: Utc::now(),
        };
        self.store.accounts.insert(account.id.clone(), account.clone());
        self.event_sender.send(Event::AccountCreated {
            account_id: account.id.clone(),
            role: account.role,
        });
        info!(account_id = %account.id, "account created");
        Ok(account)
    }

    #[instrument(skip(self, request), fields(account_id = %account_id))]
    pub fn update(
        &self,
        account_id: &str,
        request: UpdateAccountRequest,
    ) -> Result<Account, ServiceError> {
        request.validate()?;
        if let Some(referrer) = &request.referred_by {
            self.validate_referral_edge(account_id, referrer)?;
        }
        let mut account = self
            .store
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {account_id} not found")))?;

        if let Some(name) = request.name {
            account.name = name;
        }
        if let Some(mobile) = request.mobile {
            account.mobile = mobile;
        }
        if let Some(email) = request.email {
            account.email = Some(email);
        }
        if let Some(role) = request.role {
            account.role = role;
            if role == StaffRole::Manager && account.manager_rank.is_none() {
                account.manager_rank = Some(ManagerRank::Associate);
            }
        }
        if let Some(referred_by) = request.referred_by {
            account.referred_by = Some(referred_by);
        }
        if let Some(pin) = request.wallet_pin {
            account.wallet_pin = Some(pin);
        }
        if let Some(rank) = request.manager_rank {
            account.manager_rank = Some(rank);
        }
        Ok(account.clone())
    }

    pub fn get(&self, account_id: &str) -> Result<Account, ServiceError> {
        self.store
            .accounts
            .get(account_id)
            .map(|a| a.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("account {account_id} not found")))
    }

    pub fn list(&self, role: Option<StaffRole>) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .store
            .accounts
            .iter()
            .filter(|a| a.active && role.map_or(true, |r| a.role == r))
            .map(|a| a.clone())
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }

    /// Soft delete: accounts referenced by ledger entries are never removed,
    /// they stop appearing in listings and can no longer log in.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub fn deactivate(&self, actor_id: &str, account_id: &str) -> Result<(), ServiceError> {
        self.require_admin(actor_id)?;
        let mut account = self
            .store
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {account_id} not found")))?;
        account.active = false;
        drop(account);
        self.event_sender.send(Event::AccountDeactivated {
            account_id: account_id.to_string(),
        });
        Ok(())
    }

    /// Credential gate. Matches on id, email or mobile; the core trusts the
    /// returned account for subsequent capability checks.
    #[instrument(skip(self, password))]
    pub fn login(&self, identifier: &str, password: &str) -> Result<Account, ServiceError> {
        let found = self.store.accounts.iter().find(|a| {
            a.active
                && (a.id == identifier
                    || a.mobile == identifier
                    || a.email.as_deref() == Some(identifier))
        });
        match found {
            Some(account) if account.password == password => Ok(account.clone()),
            Some(_) => {
                warn!(identifier, "login rejected: bad credentials");
                Err(ServiceError::Unauthorized("invalid credentials".into()))
            }
            None => Err(ServiceError::Unauthorized("invalid credentials".into())),
        }
    }

    /// Rank progress for a showroom manager: how many showrooms they have
    /// referred and the rank that count earns.
    pub fn manager_stats(&self, manager_id: &str) -> Result<ManagerStats, ServiceError> {
        let manager = self.get(manager_id)?;
        if manager.role != StaffRole::Manager {
            return Err(ServiceError::InvalidOperation(format!(
                "account {manager_id} is not a manager"
            )));
        }
        let showrooms = self
            .store
            .accounts
            .iter()
            .filter(|a| {
                a.active
                    && a.role == StaffRole::Showroom
                    && a.referred_by.as_deref() == Some(manager_id)
            })
            .count();
        Ok(ManagerStats {
            current_rank: manager.manager_rank.unwrap_or(ManagerRank::Associate),
            earned_rank: ManagerRank::for_showroom_count(showrooms),
            referred_showrooms: showrooms,
        })
    }

    pub fn require_admin(&self, actor_id: &str) -> Result<Account, ServiceError> {
        let actor = self.get(actor_id)?;
        if actor.role != StaffRole::Admin {
            return Err(ServiceError::Unauthorized(format!(
                "account {actor_id} is not an admin"
            )));
        }
        Ok(actor)
    }

    /// Reject referral edges that would break the upline forest: unknown
    /// referrers, self-references, and cycles. The cycle walk is bounded the
    /// same way the cascade is.
    fn validate_referral_edge(&self, account_id: &str, referrer_id: &str) -> Result<(), ServiceError> {
        if account_id == referrer_id {
            return Err(ServiceError::ValidationError(
                "an account cannot refer itself".into(),
            ));
        }
        if !self.store.accounts.contains_key(referrer_id) {
            return Err(ServiceError::NotFound(format!(
                "referrer {referrer_id} not found"
            )));
        }
        // Walk up from the proposed referrer; reaching the account being
        // edited means the edge would close a loop.
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = Some(referrer_id.to_string());
        for _ in 0..=MAX_REFERRAL_DEPTH {
            let Some(current) = cursor else { break };
            if current == account_id {
                return Err(ServiceError::ValidationError(
                    "referral edge would create a cycle".into(),
                ));
            }
            if !seen.insert(current.clone()) {
                break;
            }
            cursor = self
                .store
                .accounts
                .get(&current)
                .and_then(|a| a.referred_by.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{account, account_referred_by, store_and_events};

    fn service() -> (AccountService, Arc<Datastore>) {
        let (store, events, _rx) = store_and_events();
        (AccountService::new(store.clone(), events), store)
    }

    fn create_request(id: &str, role: StaffRole, referred_by: Option<&str>) -> CreateAccountRequest {
        CreateAccountRequest {
            id: id.into(),
            name: format!("{id} person"),
            mobile: "9876543210".into(),
            email: None,
            role,
            password: None,
            referred_by: referred_by.map(Into::into),
            wallet_pin: None,
        }
    }

    #[test]
    fn create_and_login_roundtrip() {
        let (svc, _store) = service();
        svc.create(create_request("MGR001", StaffRole::Showroom, None)).unwrap();

        let account = svc.login("MGR001", "123456").unwrap();
        assert_eq!(account.role, StaffRole::Showroom);

        let err = svc.login("MGR001", "wrong").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn duplicate_id_rejected() {
        let (svc, _store) = service();
        svc.create(create_request("X", StaffRole::Cutting, None)).unwrap();
        let err = svc.create(create_request("X", StaffRole::Cutting, None)).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn self_referral_rejected() {
        let (svc, _store) = service();
        let err = svc
            .create(create_request("A", StaffRole::Showroom, Some("A")))
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn referral_cycle_rejected_on_update() {
        let (svc, store) = service();
        store.accounts.insert("A".into(), account("A", StaffRole::Manager));
        store
            .accounts
            .insert("B".into(), account_referred_by("B", StaffRole::Showroom, "A"));

        // A -> referred_by B would close A <- B <- A.
        let err = svc
            .update(
                "A",
                UpdateAccountRequest {
                    referred_by: Some("B".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn deactivated_accounts_cannot_login_and_drop_from_listing() {
        let (svc, store) = service();
        store.accounts.insert("ADM001".into(), account("ADM001", StaffRole::Admin));
        svc.create(create_request("W1", StaffRole::Cutting, None)).unwrap();

        svc.deactivate("ADM001", "W1").unwrap();
        assert!(svc.login("W1", "123456").is_err());
        assert!(svc.list(Some(StaffRole::Cutting)).is_empty());
        // Still present for ledger reference.
        assert!(store.accounts.contains_key("W1"));
    }

    #[test]
    fn deactivate_requires_admin() {
        let (svc, store) = service();
        store.accounts.insert("W1".into(), account("W1", StaffRole::Cutting));
        store.accounts.insert("W2".into(), account("W2", StaffRole::Cutting));
        let err = svc.deactivate("W1", "W2").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn manager_accounts_start_at_associate_rank() {
        let (svc, _store) = service();
        let account = svc.create(create_request("M1", StaffRole::Manager, None)).unwrap();
        assert_eq!(account.manager_rank, Some(ManagerRank::Associate));
    }

    #[test]
    fn manager_stats_count_referred_showrooms() {
        let (svc, _store) = service();
        svc.create(create_request("M1", StaffRole::Manager, None)).unwrap();
        for i in 0..2 {
            svc.create(create_request(&format!("S{i}"), StaffRole::Showroom, Some("M1")))
                .unwrap();
        }
        // A referred cutting worker does not count towards rank.
        svc.create(create_request("W1", StaffRole::Cutting, Some("M1"))).unwrap();

        let stats = svc.manager_stats("M1").unwrap();
        assert_eq!(stats.referred_showrooms, 2);
        assert_eq!(stats.earned_rank, Some(ManagerRank::Associate));

        let err = svc.manager_stats("W1").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }
}
