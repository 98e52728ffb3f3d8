use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::Customer;
use crate::store::Datastore;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 10, max = 10, message = "Mobile must be 10 digits"))]
    pub mobile: String,
    pub address: Option<String>,
}

/// Customer directory. Thin by design: the workflow engine only needs lookup,
/// the new-customer flag and the measurement sheet.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<Datastore>,
}

impl CustomerService {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(mobile = %request.mobile))]
    pub fn register(&self, request: RegisterCustomerRequest) -> Result<Customer, ServiceError> {
        request.validate()?;
        if self.by_mobile(&request.mobile).is_some() {
            return Err(ServiceError::ValidationError(format!(
                "customer with mobile {} already registered",
                request.mobile
            )));
        }
        let customer = Customer {
            id: self.store.next_customer_id(),
            name: request.name,
            mobile: request.mobile,
            address: request.address,
            is_new: true,
            measurements: BTreeMap::new(),
            created_at: Utc::now(),
        };
        self.store
            .customers
            .insert(customer.id.clone(), customer.clone());
        info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    pub fn get(&self, customer_id: &str) -> Result<Customer, ServiceError> {
        self.store
            .customers
            .get(customer_id)
            .map(|c| c.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("customer {customer_id} not found")))
    }

    pub fn by_mobile(&self, mobile: &str) -> Option<Customer> {
        self.store
            .customers
            .iter()
            .find(|c| c.mobile == mobile)
            .map(|c| c.clone())
    }

    pub fn list(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> =
            self.store.customers.iter().map(|c| c.clone()).collect();
        customers.sort_by(|a, b| a.id.cmp(&b.id));
        customers
    }

    /// Merge measurement fields into the customer's sheet. Existing keys are
    /// overwritten; the sheet is otherwise preserved.
    #[instrument(skip(self, fields), fields(customer_id = %customer_id))]
    pub fn update_measurements(
        &self,
        customer_id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<Customer, ServiceError> {
        let mut customer = self
            .store
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| ServiceError::NotFound(format!("customer {customer_id} not found")))?;
        customer.measurements.extend(fields);
        Ok(customer.clone())
    }
}
