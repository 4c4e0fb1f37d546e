//! Data Transfer Objects (DTOs) for requests.
//!
//! Each `Save*Resource` is the inbound shape of one entity: every field
//! except the id. Converting one is a pure field-for-field projection.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Country, CountryCurrency, Currency, Department, LaundryServiceMaterial, Material, Order,
    OrderStatus, PaymentMethod, Promotion, Service, Subscription, User, UserProfile,
    UserSubscription,
};
use crate::entity::Entity;

/// An inbound resource that projects onto an entity.
pub trait SaveResource: DeserializeOwned + Send + 'static {
    type Entity: Entity;

    fn into_entity(self) -> Self::Entity;
}

// ─────────────────────────────────────────────────────────────────────────────
// Users & orders
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserResource {
    pub email: String,
    pub password: String,
}

impl SaveResource for SaveUserResource {
    type Entity = User;

    fn into_entity(self) -> User {
        User::new(self.email, self.password)
    }
}

/// Request to place or update an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOrderResource {
    pub user_id: i64,
    pub order_status_id: i64,
    pub delivery_address: String,
    pub order_amount: f64,
    /// RFC 3339 timestamp
    pub delivery_date: DateTime<Utc>,
}

impl SaveResource for SaveOrderResource {
    type Entity = Order;

    fn into_entity(self) -> Order {
        Order::new(
            self.user_id,
            self.order_status_id,
            self.delivery_address,
            self.order_amount,
            self.delivery_date,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserProfileResource {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl SaveResource for SaveUserProfileResource {
    type Entity = UserProfile;

    fn into_entity(self) -> UserProfile {
        UserProfile {
            id: None,
            user_id: self.user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            address: self.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserSubscriptionResource {
    pub user_id: i64,
    pub subscription_id: i64,
    /// RFC 3339 timestamp
    pub start_date: DateTime<Utc>,
}

impl SaveResource for SaveUserSubscriptionResource {
    type Entity = UserSubscription;

    fn into_entity(self) -> UserSubscription {
        UserSubscription {
            id: None,
            user_id: self.user_id,
            subscription_id: self.subscription_id,
            start_date: self.start_date,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Shape shared by every entity that only carries a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveNamedResource<E> {
    pub name: String,
    #[serde(skip)]
    _entity: std::marker::PhantomData<fn() -> E>,
}

impl<E> SaveNamedResource<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _entity: std::marker::PhantomData,
        }
    }
}

pub type SavePaymentMethodResource = SaveNamedResource<PaymentMethod>;
pub type SaveServiceResource = SaveNamedResource<Service>;
pub type SaveMaterialResource = SaveNamedResource<Material>;
pub type SaveOrderStatusResource = SaveNamedResource<OrderStatus>;
pub type SaveCountryResource = SaveNamedResource<Country>;

macro_rules! named_resource {
    ($($ty:ident),*) => {
        $(
        impl SaveResource for SaveNamedResource<$ty> {
            type Entity = $ty;

            fn into_entity(self) -> $ty {
                $ty::new(self.name)
            }
        }
        )*
    };
}

named_resource!(PaymentMethod, Service, Material, OrderStatus, Country);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePromotionResource {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_percentage: f64,
}

impl SaveResource for SavePromotionResource {
    type Entity = Promotion;

    fn into_entity(self) -> Promotion {
        Promotion {
            id: None,
            name: self.name,
            description: self.description,
            discount_percentage: self.discount_percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSubscriptionResource {
    pub name: String,
    pub price: f64,
    pub duration_months: i64,
}

impl SaveResource for SaveSubscriptionResource {
    type Entity = Subscription;

    fn into_entity(self) -> Subscription {
        Subscription {
            id: None,
            name: self.name,
            price: self.price,
            duration_months: self.duration_months,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLaundryServiceMaterialResource {
    pub service_id: i64,
    pub material_id: i64,
    pub quantity: i64,
}

impl SaveResource for SaveLaundryServiceMaterialResource {
    type Entity = LaundryServiceMaterial;

    fn into_entity(self) -> LaundryServiceMaterial {
        LaundryServiceMaterial {
            id: None,
            service_id: self.service_id,
            material_id: self.material_id,
            quantity: self.quantity,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geography
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCurrencyResource {
    pub name: String,
    pub symbol: String,
}

impl SaveResource for SaveCurrencyResource {
    type Entity = Currency;

    fn into_entity(self) -> Currency {
        Currency::new(self.name, self.symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDepartmentResource {
    pub name: String,
    pub country_id: i64,
}

impl SaveResource for SaveDepartmentResource {
    type Entity = Department;

    fn into_entity(self) -> Department {
        Department {
            id: None,
            name: self.name,
            country_id: self.country_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCountryCurrencyResource {
    pub country_id: i64,
    pub currency_id: i64,
}

impl SaveResource for SaveCountryCurrencyResource {
    type Entity = CountryCurrency;

    fn into_entity(self) -> CountryCurrency {
        CountryCurrency {
            id: None,
            country_id: self.country_id,
            currency_id: self.currency_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_resource_from_json() {
        let res: SaveServiceResource = serde_json::from_str(r#"{"name": "Planchado"}"#).unwrap();
        let service = res.into_entity();
        assert_eq!(service.id, None);
        assert_eq!(service.name, "Planchado");
    }

    #[test]
    fn test_order_resource_from_json() {
        let res: SaveOrderResource = serde_json::from_str(
            r#"{
                "user_id": 100,
                "order_status_id": 1,
                "delivery_address": "Av. Arequipa 1000",
                "order_amount": 32.5,
                "delivery_date": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        let order = res.into_entity();
        assert_eq!(order.id, None);
        assert_eq!(order.user_id, 100);
        assert_eq!(order.delivery_date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_promotion_description_defaults_to_none() {
        let res: SavePromotionResource =
            serde_json::from_str(r#"{"name": "Verano", "discount_percentage": 10}"#).unwrap();
        assert_eq!(res.into_entity().description, None);
    }

    #[test]
    fn test_user_profile_optional_fields() {
        let res: SaveUserProfileResource = serde_json::from_str(
            r#"{"user_id": 100, "first_name": "Felipe", "last_name": "Rojas"}"#,
        )
        .unwrap();
        let profile = res.into_entity();
        assert_eq!(profile.id, None);
        assert_eq!(profile.user_id, 100);
        assert_eq!(profile.phone_number, None);
        assert_eq!(profile.address, None);
    }

    #[test]
    fn test_service_material_requires_quantity() {
        let missing = serde_json::from_str::<SaveLaundryServiceMaterialResource>(
            r#"{"service_id": 100, "material_id": 1}"#,
        );
        assert!(missing.is_err());
    }
}
