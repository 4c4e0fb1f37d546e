//! The laundry service's schema model.

use super::model::{EntityType, Model};
use crate::domain::{
    Country, CountryCurrency, Currency, Department, LaundryServiceMaterial, Material, Order,
    OrderStatus, PaymentMethod, Promotion, Service, Subscription, User, UserProfile,
    UserSubscription,
};
use crate::entity::Entity;
use crate::error::ModelError;

fn seeded<E: Entity>() -> EntityType {
    E::entity_type().with_seed(E::seed().iter().map(E::to_record).collect())
}

/// Every entity type with its seed rows, under its declared names.
pub fn declared_laundry_model() -> Result<Model, ModelError> {
    Model::build(vec![
        seeded::<User>(),
        seeded::<PaymentMethod>(),
        seeded::<Service>(),
        seeded::<Material>(),
        seeded::<Promotion>(),
        seeded::<Subscription>(),
        seeded::<Currency>(),
        seeded::<Country>(),
        seeded::<Department>(),
        seeded::<CountryCurrency>(),
        seeded::<OrderStatus>(),
        seeded::<Order>(),
        seeded::<UserProfile>(),
        seeded::<UserSubscription>(),
        seeded::<LaundryServiceMaterial>(),
    ])
}

/// The model the stores run against: declared names rewritten to snake_case.
pub fn laundry_model() -> Result<Model, ModelError> {
    let mut model = declared_laundry_model()?;
    model.apply_snake_case_naming();
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let model = laundry_model().unwrap();
        let tables: Vec<_> = model
            .entity_types()
            .iter()
            .map(|et| et.table.as_str())
            .collect();

        assert_eq!(
            tables,
            vec![
                "users",
                "payment_methods",
                "services",
                "materials",
                "promotions",
                "subscriptions",
                "currencies",
                "countries",
                "departments",
                "country_currencies",
                "order_statuses",
                "orders",
                "user_profiles",
                "user_subscriptions",
                "laundry_service_materials",
            ]
        );
    }

    #[test]
    fn test_every_identifier_is_snake_case() {
        let model = laundry_model().unwrap();
        let is_snake = |s: &str| !s.chars().any(|c| c.is_uppercase());

        for et in model.entity_types() {
            assert!(is_snake(&et.table));
            assert!(is_snake(&et.primary_key().name));
            for p in et.properties() {
                assert!(is_snake(&p.column), "{}.{}", et.name, p.name);
            }
            for fk in et.foreign_keys() {
                assert!(is_snake(&fk.constraint_name));
            }
            for ix in et.indexes() {
                assert!(is_snake(&ix.name));
            }
        }
    }

    #[test]
    fn test_order_constraints() {
        let model = laundry_model().unwrap();
        let order = model.entity("Order").unwrap();

        let fks: Vec<_> = order
            .foreign_keys()
            .iter()
            .map(|fk| fk.constraint_name.as_str())
            .collect();
        assert_eq!(
            fks,
            vec![
                "fk_orders_users_user_id",
                "fk_orders_order_statuses_order_status_id"
            ]
        );
        assert_eq!(order.column("DeliveryDate"), Some("delivery_date"));
        assert_eq!(order.primary_key().name, "pk_orders");
    }

    #[test]
    fn test_seeds_attached() {
        let model = laundry_model().unwrap();
        let seeds = |name: &str| model.entity(name).unwrap().seed().len();

        assert_eq!(seeds("User"), 2);
        assert_eq!(seeds("PaymentMethod"), 2);
        assert_eq!(seeds("Service"), 2);
        assert_eq!(seeds("Currency"), 3);
        assert_eq!(seeds("Country"), 2);
        assert_eq!(seeds("CountryCurrency"), 4);
        assert_eq!(seeds("Order"), 0);
        assert_eq!(seeds("UserSubscription"), 0);
    }

    #[test]
    fn test_membership_and_material_constraints() {
        let model = laundry_model().unwrap();
        let fk_names = |name: &str| -> Vec<String> {
            model
                .entity(name)
                .unwrap()
                .foreign_keys()
                .iter()
                .map(|fk| fk.constraint_name.clone())
                .collect()
        };

        assert_eq!(
            fk_names("UserProfile"),
            vec!["fk_user_profiles_users_user_id"]
        );
        assert_eq!(
            fk_names("UserSubscription"),
            vec![
                "fk_user_subscriptions_users_user_id",
                "fk_user_subscriptions_subscriptions_subscription_id"
            ]
        );
        assert_eq!(
            fk_names("LaundryServiceMaterial"),
            vec![
                "fk_laundry_service_materials_services_service_id",
                "fk_laundry_service_materials_materials_material_id"
            ]
        );

        let profile = model.entity("UserProfile").unwrap();
        assert!(
            profile
                .indexes()
                .iter()
                .any(|ix| ix.unique && ix.name == "ix_user_profiles_user_id")
        );
    }

    #[test]
    fn test_overlapping_seed_ids_live_in_separate_tables() {
        let model = laundry_model().unwrap();
        let ids = |name: &str| -> Vec<Option<i64>> {
            model
                .entity(name)
                .unwrap()
                .seed()
                .iter()
                .map(|r| r.id())
                .collect()
        };

        assert_eq!(ids("User"), vec![Some(100), Some(101)]);
        assert_eq!(ids("Service"), vec![Some(100), Some(101)]);
    }
}
