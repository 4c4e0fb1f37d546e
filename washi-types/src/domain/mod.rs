//! Domain models for the laundry service.

pub mod catalog;
pub mod geography;
pub mod membership;
pub mod order;
pub mod user;

pub use catalog::{
    LaundryServiceMaterial, Material, OrderStatus, PaymentMethod, Promotion, Service,
    Subscription,
};
pub use geography::{Country, CountryCurrency, Currency, Department};
pub use membership::{UserProfile, UserSubscription};
pub use order::Order;
pub use user::User;
