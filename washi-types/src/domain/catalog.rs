//! What the laundry sells: services and the materials they use, plans,
//! promotions, and the lookup tables orders refer to.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ID, Record};
use crate::error::DomainError;
use crate::schema::{EntityType, Property};

/// Declares an entity whose only attribute is a required `Name` (≤50).
macro_rules! named_entity {
    (
        $(#[$meta:meta])*
        $ty:ident, $label:literal, $table:literal
        $(, seed: [$(($seed_id:literal, $seed_name:literal)),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $ty {
            pub id: Option<i64>,
            pub name: String,
        }

        impl $ty {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    id: None,
                    name: name.into(),
                }
            }
        }

        impl Entity for $ty {
            const NAME: &'static str = stringify!($ty);
            const LABEL: &'static str = $label;

            fn entity_type() -> EntityType {
                EntityType::new(Self::NAME, $table)
                    .property(Property::text("Name", 50).required())
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
                    .with("Name", self.name.as_str())
            }

            fn from_record(record: &Record) -> Result<Self, DomainError> {
                Ok(Self {
                    id: record.id(),
                    name: record.text("Name")?,
                })
            }

            fn apply_patch(&mut self, patch: &Self) {
                self.name = patch.name.clone();
            }

            $(
            fn seed() -> Vec<Self> {
                vec![$(Self {
                    id: Some($seed_id),
                    name: $seed_name.into(),
                }),*]
            }
            )?
        }
    };
}

named_entity!(
    /// A way of paying for an order.
    PaymentMethod, "payment method", "PaymentMethods",
    seed: [(67, "TarjetaDeRegalo"), (68, "TarjetaConeyPark")]
);

named_entity!(
    /// A laundry service offered (dry cleaning, ironing, ...).
    Service, "service", "Services",
    seed: [(100, "LavadoalSeco"), (101, "Planchado")]
);

named_entity!(
    /// A material used while servicing an order.
    Material, "material", "Materials"
);

named_entity!(
    /// Lifecycle stage of an order.
    OrderStatus, "order status", "OrderStatuses"
);

/// A discount campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// 0 to 100
    pub discount_percentage: f64,
}

impl Entity for Promotion {
    const NAME: &'static str = "Promotion";
    const LABEL: &'static str = "promotion";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Promotions")
            .property(Property::text("Name", 50).required())
            .property(Property::text("Description", 200))
            .property(Property::real("DiscountPercentage").required())
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
            .with("Name", self.name.as_str())
            .with("Description", self.description.clone())
            .with("DiscountPercentage", self.discount_percentage)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            name: record.text("Name")?,
            description: record.optional_text("Description")?,
            discount_percentage: record.real("DiscountPercentage")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.name = patch.name.clone();
        self.description = patch.description.clone();
        self.discount_percentage = patch.discount_percentage;
    }
}

/// A recurring laundry plan users can subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub duration_months: i64,
}

impl Entity for Subscription {
    const NAME: &'static str = "Subscription";
    const LABEL: &'static str = "subscription";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Subscriptions")
            .property(Property::text("Name", 50).required())
            .property(Property::real("Price").required())
            .property(Property::integer("DurationMonths").required())
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
            .with("Name", self.name.as_str())
            .with("Price", self.price)
            .with("DurationMonths", self.duration_months)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            name: record.text("Name")?,
            price: record.real("Price")?,
            duration_months: record.integer("DurationMonths")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.name = patch.name.clone();
        self.price = patch.price;
        self.duration_months = patch.duration_months;
    }
}

/// Join row: how much of a material one service uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaundryServiceMaterial {
    pub id: Option<i64>,
    pub service_id: i64,
    pub material_id: i64,
    pub quantity: i64,
}

impl Entity for LaundryServiceMaterial {
    const NAME: &'static str = "LaundryServiceMaterial";
    const LABEL: &'static str = "laundry service material";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "LaundryServiceMaterials")
            .property(Property::integer("ServiceId").required())
            .property(Property::integer("MaterialId").required())
            .property(Property::integer("Quantity").required())
            .foreign_key("ServiceId", "Service")
            .foreign_key("MaterialId", "Material")
            .unique_index(&["ServiceId", "MaterialId"])
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
            .with("ServiceId", self.service_id)
            .with("MaterialId", self.material_id)
            .with("Quantity", self.quantity)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            service_id: record.integer("ServiceId")?,
            material_id: record.integer("MaterialId")?,
            quantity: record.integer("Quantity")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.quantity = patch.quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entity_descriptor() {
        let et = PaymentMethod::entity_type();
        assert_eq!(et.name, "PaymentMethod");
        assert_eq!(et.table, "PaymentMethods");
        assert_eq!(PaymentMethod::LABEL, "payment method");

        let names: Vec<_> = et.properties().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Id", "Name"]);
    }

    #[test]
    fn test_seeds() {
        let services = Service::seed();
        assert_eq!(services[0].id, Some(100));
        assert_eq!(services[1].name, "Planchado");
        assert!(Material::seed().is_empty());
        assert!(OrderStatus::seed().is_empty());
    }

    #[test]
    fn test_promotion_optional_description() {
        let promo = Promotion {
            id: Some(1),
            name: "Verano".into(),
            description: None,
            discount_percentage: 15.0,
        };
        let record = promo.to_record();
        assert!(record.get("Description").is_null());
        assert!(promo.validate().is_ok());
        assert_eq!(Promotion::from_record(&record).unwrap(), promo);
    }

    #[test]
    fn test_service_material_patch_copies_quantity_only() {
        let mut usage = LaundryServiceMaterial {
            id: Some(1),
            service_id: 100,
            material_id: 5,
            quantity: 2,
        };
        usage.apply_patch(&LaundryServiceMaterial {
            id: None,
            service_id: 101,
            material_id: 6,
            quantity: 4,
        });

        assert_eq!((usage.service_id, usage.material_id), (100, 5));
        assert_eq!(usage.quantity, 4);
    }
}
