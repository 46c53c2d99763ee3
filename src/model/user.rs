use derive_new::new;
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};

use super::Timestamp;

pub type UserId = Thing;

pub fn new_user_id() -> UserId {
    Thing::from((User::TABLE.to_string(), Id::uuid()))
}

/// The slice of a user document the aggregator cares about. The marketplace
/// backend owns the full record; we only ever count rows and inspect the
/// subscription status.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct User {
    #[new(value = "new_user_id()")]
    pub id: UserId,
    #[new(default)]
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    #[new(default)]
    pub subscription: Subscription,
}

impl User {
    pub const TABLE: &'static str = "users";

    pub fn subscribed(mut self) -> Self {
        self.subscription.status = SubscriptionStatus::Active;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subscription {
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Created,
    Active,
    Cancelled,
}
