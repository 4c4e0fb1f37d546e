//! What a user owns beyond their credentials: a profile and plan
//! subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ID, Record};
use crate::error::DomainError;
use crate::schema::{EntityType, Property};

/// Personal details of a user. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl Entity for UserProfile {
    const NAME: &'static str = "UserProfile";
    const LABEL: &'static str = "user profile";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "UserProfiles")
            .property(Property::integer("UserId").required())
            .property(Property::text("FirstName", 50).required())
            .property(Property::text("LastName", 50).required())
            .property(Property::text("PhoneNumber", 20))
            .property(Property::text("Address", 200))
            .foreign_key("UserId", "User")
            .unique_index(&["UserId"])
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("UserId", self.user_id)
            .with("FirstName", self.first_name.as_str())
            .with("LastName", self.last_name.as_str())
            .with("PhoneNumber", self.phone_number.clone())
            .with("Address", self.address.clone())
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            user_id: record.integer("UserId")?,
            first_name: record.text("FirstName")?,
            last_name: record.text("LastName")?,
            phone_number: record.optional_text("PhoneNumber")?,
            address: record.optional_text("Address")?,
        })
    }

    /// The owning user never changes.
    fn apply_patch(&mut self, patch: &Self) {
        self.first_name = patch.first_name.clone();
        self.last_name = patch.last_name.clone();
        self.phone_number = patch.phone_number.clone();
        self.address = patch.address.clone();
    }
}

/// Join row: a user enrolled in a subscription plan from a start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: Option<i64>,
    pub user_id: i64,
    pub subscription_id: i64,
    pub start_date: DateTime<Utc>,
}

impl Entity for UserSubscription {
    const NAME: &'static str = "UserSubscription";
    const LABEL: &'static str = "user subscription";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "UserSubscriptions")
            .property(Property::integer("UserId").required())
            .property(Property::integer("SubscriptionId").required())
            .property(Property::timestamp("StartDate").required())
            .foreign_key("UserId", "User")
            .foreign_key("SubscriptionId", "Subscription")
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("UserId", self.user_id)
            .with("SubscriptionId", self.subscription_id)
            .with("StartDate", self.start_date)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            user_id: record.integer("UserId")?,
            subscription_id: record.integer("SubscriptionId")?,
            start_date: record.timestamp("StartDate")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.subscription_id = patch.subscription_id;
        self.start_date = patch.start_date;
    }
}
