//! Customer profile lookup, backed by the external user/auth provider.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

/// The slice of a user profile that checkout snapshots onto an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
}

/// Trait for resolving an authenticated principal to a profile.
///
/// The core trusts the supplied identity verbatim; authentication happens
/// upstream.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Returns the profile for a user, or `None` if unknown.
    async fn get(&self, user_id: UserId) -> Option<CustomerProfile>;
}

/// In-memory customer directory for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    profiles: Arc<RwLock<HashMap<UserId, CustomerProfile>>>,
}

impl InMemoryCustomerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a profile for a user.
    pub fn put(&self, user_id: UserId, name: impl Into<String>, email: impl Into<String>) {
        self.profiles.write().unwrap().insert(
            user_id,
            CustomerProfile {
                name: name.into(),
                email: email.into(),
            },
        );
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get(&self, user_id: UserId) -> Option<CustomerProfile> {
        self.profiles.read().unwrap().get(&user_id).cloned()
    }
}
