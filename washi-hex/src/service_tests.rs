//! CrudService and OrderService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use washi_types::{
        Entity, Filter, OperationResponse, Order, Record, RepoError, ServiceAction, ServiceError,
        Store, UnitOfWork, User,
    };

    use crate::{CrudService, OrderService};

    #[derive(Default)]
    struct Tables {
        rows: HashMap<&'static str, BTreeMap<i64, Record>>,
        next_id: i64,
    }

    impl Tables {
        fn contains(&self, entity: &'static str, id: i64) -> bool {
            self.rows.get(entity).is_some_and(|t| t.contains_key(&id))
        }
    }

    /// Simple in-memory store for testing the service layer.
    pub struct MockStore {
        tables: Arc<Mutex<Tables>>,
        fail_commit: AtomicBool,
        fail_reads: AtomicBool,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self {
                tables: Arc::new(Mutex::new(Tables {
                    next_id: 1000,
                    ..Tables::default()
                })),
                fail_commit: AtomicBool::new(false),
                fail_reads: AtomicBool::new(false),
            }
        }

        pub fn fail_commits(&self) {
            self.fail_commit.store(true, Ordering::SeqCst);
        }

        pub fn fail_reads(&self) {
            self.fail_reads.store(true, Ordering::SeqCst);
        }

        pub fn count(&self, entity: &'static str) -> usize {
            self.tables
                .lock()
                .unwrap()
                .rows
                .get(entity)
                .map_or(0, BTreeMap::len)
        }

        fn check_reads(&self) -> Result<(), RepoError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepoError::Database("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Store for MockStore {
        type Work = MockWork;

        async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, RepoError> {
            self.check_reads()?;
            let tables = self.tables.lock().unwrap();
            tables
                .rows
                .get(E::NAME)
                .and_then(|t| t.get(&id))
                .map(E::from_record)
                .transpose()
                .map_err(RepoError::Domain)
        }

        async fn list<E: Entity>(&self) -> Result<Vec<E>, RepoError> {
            self.list_by(&Filter::new()).await
        }

        async fn list_by<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, RepoError> {
            self.check_reads()?;
            let tables = self.tables.lock().unwrap();
            let Some(table) = tables.rows.get(E::NAME) else {
                return Ok(Vec::new());
            };
            table
                .values()
                .filter(|r| filter.conditions().iter().all(|(p, v)| r.get(p) == v))
                .map(|r| E::from_record(r).map_err(RepoError::Domain))
                .collect()
        }

        async fn begin(&self) -> Result<MockWork, RepoError> {
            Ok(MockWork {
                tables: self.tables.clone(),
                pending: Vec::new(),
                fail_commit: self.fail_commit.load(Ordering::SeqCst),
            })
        }
    }

    enum Pending {
        Put(Record),
        Remove(&'static str, i64),
    }

    pub struct MockWork {
        tables: Arc<Mutex<Tables>>,
        pending: Vec<Pending>,
        fail_commit: bool,
    }

    #[async_trait]
    impl UnitOfWork for MockWork {
        async fn add<E: Entity>(&mut self, mut entity: E) -> Result<E, RepoError> {
            entity.validate()?;
            let id = match entity.id() {
                Some(id) => id,
                None => {
                    let mut tables = self.tables.lock().unwrap();
                    tables.next_id += 1;
                    tables.next_id
                }
            };
            entity.set_id(Some(id));
            self.pending.push(Pending::Put(entity.to_record()));
            Ok(entity)
        }

        async fn update<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError> {
            let id = entity.id().ok_or(RepoError::NotFound)?;
            if !self.tables.lock().unwrap().contains(E::NAME, id) {
                return Err(RepoError::NotFound);
            }
            entity.validate()?;
            self.pending.push(Pending::Put(entity.to_record()));
            Ok(())
        }

        async fn remove<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError> {
            let id = entity.id().ok_or(RepoError::NotFound)?;
            if !self.tables.lock().unwrap().contains(E::NAME, id) {
                return Err(RepoError::NotFound);
            }
            self.pending.push(Pending::Remove(E::NAME, id));
            Ok(())
        }

        async fn commit(self) -> Result<(), RepoError> {
            if self.fail_commit {
                return Err(RepoError::Transaction("simulated commit failure".into()));
            }
            let mut tables = self.tables.lock().unwrap();
            for op in self.pending {
                match op {
                    Pending::Put(record) => {
                        let id = record.id().ok_or(RepoError::NotFound)?;
                        tables.rows.entry(record.entity()).or_default().insert(id, record);
                    }
                    Pending::Remove(entity, id) => {
                        if let Some(table) = tables.rows.get_mut(entity) {
                            table.remove(&id);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    fn setup() -> (Arc<MockStore>, OrderService<MockStore>) {
        let store = Arc::new(MockStore::new());
        let orders = OrderService::new(store.clone());
        (store, orders)
    }

    fn order(user_id: i64, status_id: i64, address: &str) -> Order {
        Order::new(
            user_id,
            status_id,
            address,
            40.0,
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // find / list
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_find_existing_order() {
        let (_, orders) = setup();
        let saved = orders.save(order(1, 1, "Jr. Lampa 100")).await.unwrap();

        let found = orders.find_by_id(saved.id.unwrap()).await.unwrap();

        assert_eq!(found, saved);
    }

    #[tokio::test]
    async fn test_find_missing_order_is_not_found() {
        let (_, orders) = setup();

        let err = orders.find_by_id(77).await.unwrap_err();

        assert_eq!(err, ServiceError::NotFound { entity: "order" });
        assert_eq!(err.to_string(), "Order not found");
    }

    #[tokio::test]
    async fn test_list_read_failure_is_persistence_error() {
        let (store, orders) = setup();
        store.fail_reads();

        let err = orders.list().await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Persistence {
                action: ServiceAction::Retrieving,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "An error occurred while retrieving the order: Database error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_list_by_user_and_status() {
        let (_, orders) = setup();
        orders.save(order(1, 10, "A")).await.unwrap();
        orders.save(order(1, 20, "B")).await.unwrap();
        orders.save(order(2, 10, "C")).await.unwrap();

        let by_user = orders.list_by_user(1).await.unwrap();
        assert_eq!(by_user.len(), 2);
        assert!(by_user.iter().all(|o| o.user_id == 1));

        let by_status = orders.list_by_user_and_status(1, 10).await.unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].delivery_address, "A");

        let none = orders.list_by_user(3).await.unwrap();
        assert!(none.is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // save
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_save_assigns_new_id_and_discards_caller_id() {
        let (store, orders) = setup();
        let first = orders.save(order(1, 1, "A")).await.unwrap();

        let mut with_id = order(1, 1, "B");
        with_id.id = first.id;
        let second = orders.save(with_id).await.unwrap();

        assert!(first.id.is_some());
        assert!(second.id.is_some());
        assert_ne!(first.id, second.id);
        assert_eq!(store.count("Order"), 2);
    }

    #[tokio::test]
    async fn test_save_validation_failure_writes_nothing() {
        let store = Arc::new(MockStore::new());
        let users: CrudService<User, MockStore> = CrudService::new(store.clone());

        let err = users
            .save(User::new("a".repeat(51), "pw"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Persistence {
                action: ServiceAction::Saving,
                entity: "user",
                ..
            }
        ));
        assert!(
            err.to_string()
                .starts_with("An error occurred while saving the user: ")
        );
        assert_eq!(store.count("User"), 0);
    }

    #[tokio::test]
    async fn test_save_commit_failure_embeds_detail() {
        let (store, orders) = setup();
        store.fail_commits();

        let err = orders.save(order(1, 1, "A")).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "An error occurred while saving the order: Transaction error: simulated commit failure"
        );
        assert_eq!(store.count("Order"), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // update
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_copies_only_whitelisted_fields() {
        let (_, orders) = setup();
        let saved = orders.save(order(1, 1, "Old address")).await.unwrap();
        let id = saved.id.unwrap();

        let mut patch = order(99, 42, "New address");
        patch.id = Some(5555);
        patch.order_amount = 75.5;
        let updated = orders.update(id, patch.clone()).await.unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.user_id, 1);
        assert_eq!(updated.order_status_id, 1);
        assert_eq!(updated.delivery_address, "New address");
        assert_eq!(updated.order_amount, 75.5);
        assert_eq!(updated.delivery_date, patch.delivery_date);

        let persisted = orders.find_by_id(id).await.unwrap();
        assert_eq!(persisted, updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found_without_mutation() {
        let (store, orders) = setup();
        orders.save(order(1, 1, "A")).await.unwrap();

        let err = orders.update(404, order(1, 1, "B")).await.unwrap_err();

        assert_eq!(err, ServiceError::NotFound { entity: "order" });
        assert_eq!(store.count("Order"), 1);
        assert_eq!(orders.list().await.unwrap()[0].delivery_address, "A");
    }

    #[tokio::test]
    async fn test_update_commit_failure_leaves_row_unchanged() {
        let (store, orders) = setup();
        let saved = orders.save(order(1, 1, "A")).await.unwrap();
        store.fail_commits();

        let err = orders
            .update(saved.id.unwrap(), order(1, 1, "B"))
            .await
            .unwrap_err();

        assert!(
            err.to_string()
                .starts_with("An error occurred while updating the order: ")
        );
        assert!(err.to_string().contains("simulated commit failure"));
        let persisted = orders.find_by_id(saved.id.unwrap()).await.unwrap();
        assert_eq!(persisted.delivery_address, "A");
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // delete
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_delete_returns_snapshot() {
        let (_, orders) = setup();
        let saved = orders.save(order(1, 1, "A")).await.unwrap();
        let id = saved.id.unwrap();

        let deleted = orders.delete(id).await.unwrap();

        assert_eq!(deleted, saved);
        assert_eq!(
            orders.find_by_id(id).await.unwrap_err(),
            ServiceError::NotFound { entity: "order" }
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_, orders) = setup();

        let err = orders.delete(12).await.unwrap_err();

        assert_eq!(err.to_string(), "Order not found");
    }

    #[tokio::test]
    async fn test_delete_commit_failure_keeps_row() {
        let (store, orders) = setup();
        let saved = orders.save(order(1, 1, "A")).await.unwrap();
        store.fail_commits();

        let err = orders.delete(saved.id.unwrap()).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Persistence {
                action: ServiceAction::Deleting,
                ..
            }
        ));
        assert_eq!(store.count("Order"), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Wire form
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_operation_response_shapes() {
        let (_, orders) = setup();

        let ok: OperationResponse<Order> = orders.save(order(1, 1, "A")).await.into();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["value"]["delivery_address"], "A");
        assert!(json.get("message").is_none());

        let err: OperationResponse<Order> = orders.find_by_id(1).await.into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["message"], "Order not found");
        assert!(json.get("value").is_none());
    }
}
