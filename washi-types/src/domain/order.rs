//! Order domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ID, Record};
use crate::error::DomainError;
use crate::schema::{EntityType, Property};

/// A laundry order placed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    pub order_status_id: i64,
    pub delivery_address: String,
    pub order_amount: f64,
    pub delivery_date: DateTime<Utc>,
}

impl Order {
    pub fn new(
        user_id: i64,
        order_status_id: i64,
        delivery_address: impl Into<String>,
        order_amount: f64,
        delivery_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            order_status_id,
            delivery_address: delivery_address.into(),
            order_amount,
            delivery_date,
        }
    }
}

impl Entity for Order {
    const NAME: &'static str = "Order";
    const LABEL: &'static str = "order";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Orders")
            .property(Property::integer("UserId").required())
            .property(Property::integer("OrderStatusId").required())
            .property(Property::text("DeliveryAddress", 200).required())
            .property(Property::real("OrderAmount").required())
            .property(Property::timestamp("DeliveryDate").required())
            .foreign_key("UserId", "User")
            .foreign_key("OrderStatusId", "OrderStatus")
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
            .with("OrderStatusId", self.order_status_id)
            .with("DeliveryAddress", self.delivery_address.as_str())
            .with("OrderAmount", self.order_amount)
            .with("DeliveryDate", self.delivery_date)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            user_id: record.integer("UserId")?,
            order_status_id: record.integer("OrderStatusId")?,
            delivery_address: record.text("DeliveryAddress")?,
            order_amount: record.real("OrderAmount")?,
            delivery_date: record.timestamp("DeliveryDate")?,
        })
    }

    /// Only the delivery details and amount are updatable; the owner and
    /// status stay as persisted.
    fn apply_patch(&mut self, patch: &Self) {
        self.delivery_address = patch.delivery_address.clone();
        self.order_amount = patch.order_amount;
        self.delivery_date = patch.delivery_date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order() -> Order {
        Order::new(
            100,
            1,
            "Av. Larco 123",
            25.5,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_patch_copies_only_whitelisted_fields() {
        let mut existing = order();
        existing.id = Some(7);

        let patch = Order {
            id: Some(99),
            user_id: 555,
            order_status_id: 3,
            delivery_address: "Jr. Union 456".into(),
            order_amount: 40.0,
            delivery_date: Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap(),
        };
        existing.apply_patch(&patch);

        assert_eq!(existing.id, Some(7));
        assert_eq!(existing.user_id, 100);
        assert_eq!(existing.order_status_id, 1);
        assert_eq!(existing.delivery_address, "Jr. Union 456");
        assert_eq!(existing.order_amount, 40.0);
        assert_eq!(existing.delivery_date, patch.delivery_date);
    }

    #[test]
    fn test_record_projection() {
        let order = order();
        let back = Order::from_record(&order.to_record()).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_address_too_long() {
        let mut order = order();
        order.delivery_address = "x".repeat(201);
        assert!(matches!(
            order.validate(),
            Err(DomainError::MaxLength {
                property: "DeliveryAddress",
                ..
            })
        ));
    }
}
