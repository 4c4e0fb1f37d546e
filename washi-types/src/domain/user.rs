//! User domain model.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ID, Record};
use crate::error::DomainError;
use crate::schema::{EntityType, Property};

/// A registered customer of the laundry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub password: String,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Entity for User {
    const NAME: &'static str = "User";
    const LABEL: &'static str = "user";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Users")
            .property(Property::text("Email", 50).required())
            .property(Property::text("Password", 50).required())
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
            .with("Email", self.email.as_str())
            .with("Password", self.password.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            email: record.text("Email")?,
            password: record.text("Password")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.email = patch.email.clone();
        self.password = patch.password.clone();
    }

    fn seed() -> Vec<Self> {
        vec![
            Self {
                id: Some(100),
                email: "felipedota2@gmail.com".into(),
                password: "slark".into(),
            },
            Self {
                id: Some(101),
                email: "xavistian@gmail.com".into(),
                password: "tiaaaaaaaan".into(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_projection() {
        let mut user = User::new("ana@example.com", "hunter2");
        user.id = Some(9);

        let record = user.to_record();
        assert_eq!(record.id(), Some(9));
        assert_eq!(User::from_record(&record).unwrap(), user);
    }

    #[test]
    fn test_email_required() {
        let record = Record::new(User::NAME).with("Password", "x");
        assert!(matches!(
            User::from_record(&record),
            Err(DomainError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_password_too_long() {
        let user = User::new("ana@example.com", "p".repeat(51));
        assert!(matches!(
            user.validate(),
            Err(DomainError::MaxLength { max: 50, .. })
        ));
    }
}
