//! End-to-end tests through the recorders.
//!
//! Covers: product lifecycle, production/sale record-edit-delete against stock,
//! rejection without side effects, published events, concurrent sales and
//! edits, and milk intake limits.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier, Mutex};

    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use dairyledger_catalog::{Product, ProductDraft};
    use dairyledger_core::{
        CustomerId, DomainError, DomainResult, EmployeeId, EntryId, MilkCollectionId, ProductId,
        Quantity, ShopId,
    };
    use dairyledger_events::{Event, EventBus, InMemoryEventBus};
    use dairyledger_ledger::{
        LedgerEvent, MilkCollectionInput, MilkSeparationInput, MilkSource, ProductionInput,
        SaleEntry, SaleInput,
    };
    use dairyledger_stock::InMemoryStockStore;

    use crate::bootstrap::{InMemoryDairy, in_memory};
    use crate::config::{CatalogConfig, DairyConfig};
    use crate::dairy::{DairyLedger, Stores};
    use crate::read_model::{EntryStore, InMemoryEntryStore};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn setup() -> InMemoryDairy {
        in_memory(&DairyConfig::default())
    }

    fn add_product(dairy: &InMemoryDairy, name: &str, ratio: Option<u32>) -> Product {
        let mut draft = ProductDraft::new(name, "kg");
        draft.ratio_to_milk = ratio.map(Quantity::from);
        dairy.create_product(draft, day(1)).unwrap()
    }

    fn production(product_id: ProductId, milk: u32, d: u32) -> ProductionInput {
        ProductionInput {
            product_id,
            milk_used_liters: Quantity::from(milk),
            produced_by: Some(EmployeeId::new()),
            date: day(d),
        }
    }

    fn sale(product_id: ProductId, quantity: u32, d: u32) -> SaleInput {
        SaleInput {
            product_id,
            quantity: Quantity::from(quantity),
            customer_id: CustomerId::new(),
            shop_id: ShopId::new(),
            total_price: Decimal::from(quantity * 10),
            date: day(d),
        }
    }

    fn collection_input(liters: u32) -> MilkCollectionInput {
        MilkCollectionInput {
            date: day(2),
            source: MilkSource::Farm,
            quantity_liters: Quantity::from(liters),
            fat_content: None,
            collected_by: None,
        }
    }

    fn separation_input(collection_id: MilkCollectionId, used: u32) -> MilkSeparationInput {
        MilkSeparationInput {
            date: day(2),
            milk_collection_id: collection_id,
            milk_used_liters: Quantity::from(used),
            cream_liters: None,
            skimmed_milk_liters: None,
            whole_milk_liters: None,
        }
    }

    fn on_hand(dairy: &InMemoryDairy, product_id: ProductId) -> Decimal {
        dairy.stock(product_id).unwrap().current_quantity
    }

    #[test]
    fn created_product_starts_with_zero_stock() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10));

        let balance = dairy.stock(cheese.id_typed()).unwrap();
        assert_eq!(balance.current_quantity, Decimal::ZERO);
        assert_eq!(balance.last_updated, Some(day(1)));

        let levels = dairy.stock_levels().unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].product, cheese);
    }

    #[test]
    fn production_uses_ratio_then_sale_consumes() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();

        let run = dairy.record_production(production(cheese, 1000, 2)).unwrap();
        assert_eq!(run.quantity_produced, Quantity::from(100));
        assert_eq!(on_hand(&dairy, cheese), Decimal::from(100));

        dairy.record_sale(sale(cheese, 30, 3)).unwrap();
        let balance = dairy.stock(cheese).unwrap();
        assert_eq!(balance.current_quantity, Decimal::from(70));
        assert_eq!(balance.last_updated, Some(day(3)));
    }

    #[test]
    fn product_without_ratio_converts_one_to_one() {
        let dairy = setup();
        let milk = add_product(&dairy, "Boiled Milk", None).id_typed();

        let run = dairy.record_production(production(milk, 250, 2)).unwrap();
        assert_eq!(run.quantity_produced, Quantity::from(250));
    }

    #[test]
    fn oversell_is_rejected_and_not_recorded() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 700, 2)).unwrap();
        let before = dairy.stock(cheese).unwrap();

        let err = dairy.record_sale(sale(cheese, 100, 3)).unwrap_err();

        match err {
            DomainError::Insufficient(a) => {
                assert_eq!(a.requested, Decimal::from(100));
                assert_eq!(a.available, Decimal::from(70));
            }
            other => panic!("expected Insufficient, got {other:?}"),
        }
        assert!(dairy.sales().is_empty());
        assert_eq!(dairy.stock(cheese).unwrap(), before);
    }

    #[test]
    fn editing_a_sale_applies_only_the_difference() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();

        let edited = dairy.edit_sale(sold.id, sale(cheese, 50, 4)).unwrap();

        assert_eq!(edited.id, sold.id);
        assert_eq!(edited.quantity, Quantity::from(50));
        assert_eq!(on_hand(&dairy, cheese), Decimal::from(50));
        assert_eq!(dairy.sale(sold.id), Some(edited));
    }

    #[test]
    fn rejected_edit_keeps_the_old_sale_and_stock() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();

        let err = dairy.edit_sale(sold.id, sale(cheese, 200, 4)).unwrap_err();

        assert!(err.availability().is_some());
        assert_eq!(dairy.sale(sold.id), Some(sold));
        assert_eq!(on_hand(&dairy, cheese), Decimal::from(70));
    }

    #[test]
    fn moving_a_sale_to_an_empty_product_fails_atomically() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let butter = add_product(&dairy, "Butter", Some(20)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();
        let cheese_before = dairy.stock(cheese).unwrap();
        let butter_before = dairy.stock(butter).unwrap();

        let err = dairy.edit_sale(sold.id, sale(butter, 5, 4)).unwrap_err();

        assert!(err.availability().is_some());
        assert_eq!(dairy.stock(cheese).unwrap(), cheese_before);
        assert_eq!(dairy.stock(butter).unwrap(), butter_before);
        assert_eq!(dairy.sale(sold.id).map(|s| s.product_id), Some(cheese));
    }

    #[test]
    fn moving_a_sale_between_stocked_products() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let butter = add_product(&dairy, "Butter", Some(20)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        dairy.record_production(production(butter, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();

        dairy.edit_sale(sold.id, sale(butter, 20, 4)).unwrap();

        assert_eq!(on_hand(&dairy, cheese), Decimal::from(100));
        assert_eq!(on_hand(&dairy, butter), Decimal::from(30));
    }

    #[test]
    fn deleting_production_retracts_its_stored_quantity() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let run = dairy.record_production(production(cheese, 1000, 2)).unwrap();

        let balance = dairy.delete_production(run.id, day(5)).unwrap();

        assert_eq!(balance.current_quantity, Decimal::ZERO);
        assert_eq!(balance.last_updated, Some(day(5)));
        assert!(dairy.production(run.id).is_none());
    }

    #[test]
    fn deleting_a_sale_restores_stock() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 40, 3)).unwrap();

        dairy.delete_sale(sold.id, day(4)).unwrap();

        assert_eq!(on_hand(&dairy, cheese), Decimal::from(100));
        assert!(matches!(
            dairy.delete_sale(sold.id, day(4)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn ratio_change_does_not_rewrite_history() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let run = dairy.record_production(production(cheese, 1000, 2)).unwrap();

        dairy
            .update_product(
                cheese,
                ProductDraft::new("Cheese", "kg").with_ratio(Quantity::from(20)),
            )
            .unwrap();
        assert_eq!(dairy.production(run.id).unwrap().quantity_produced, Quantity::from(100));

        // Editing retracts the stored 100 and applies 1000 / 20 with the new ratio.
        let edited = dairy.edit_production(run.id, production(cheese, 1000, 3)).unwrap();
        assert_eq!(edited.quantity_produced, Quantity::from(50));
        assert_eq!(on_hand(&dairy, cheese), Decimal::from(50));
    }

    #[test]
    fn unknown_product_is_rejected_before_any_write() {
        let dairy = setup();
        let ghost = ProductId::new();

        assert_eq!(
            dairy.record_production(production(ghost, 10, 2)).unwrap_err(),
            DomainError::MissingProduct(ghost)
        );
        assert_eq!(
            dairy.record_sale(sale(ghost, 1, 2)).unwrap_err(),
            DomainError::MissingProduct(ghost)
        );
        assert!(dairy.productions().is_empty());
        assert!(!dairy.stock(ghost).unwrap().exists());
    }

    #[test]
    fn editing_unknown_entry_is_not_found() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();

        assert!(matches!(
            dairy.edit_production(EntryId::new(), production(cheese, 10, 2)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn product_with_entries_cannot_be_deleted() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let run = dairy.record_production(production(cheese, 1000, 2)).unwrap();

        assert!(matches!(
            dairy.delete_product(cheese, day(3)),
            Err(DomainError::Validation(_))
        ));
        assert!(dairy.get_product(cheese).is_some());

        dairy.delete_production(run.id, day(3)).unwrap();
        let final_balance = dairy.delete_product(cheese, day(4)).unwrap();

        assert_eq!(final_balance.current_quantity, Decimal::ZERO);
        assert!(dairy.get_product(cheese).is_none());
        assert!(!dairy.stock(cheese).unwrap().exists());
        assert!(dairy.stock_levels().unwrap().is_empty());
    }

    #[test]
    fn committed_operations_publish_events_in_order() {
        let dairy = setup();
        let sub = dairy.bus().subscribe();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();
        let _ = dairy.record_sale(sale(cheese, 500, 3));
        dairy.edit_sale(sold.id, sale(cheese, 10, 4)).unwrap();
        dairy.delete_sale(sold.id, day(5)).unwrap();

        let events = sub.drain();
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "product.created",
                "production.recorded",
                "sale.recorded",
                "sale.revised",
                "sale.deleted",
            ]
        );

        match &events[3] {
            LedgerEvent::SaleRevised { previous, entry, balance_after } => {
                assert_eq!(previous.quantity, Quantity::from(30));
                assert_eq!(entry.quantity, Quantity::from(10));
                assert_eq!(*balance_after, Decimal::from(90));
            }
            other => panic!("expected SaleRevised, got {other:?}"),
        }
        assert_eq!(events[4].occurred_on(), day(5));
    }

    #[test]
    fn concurrent_sales_through_recorders_never_oversell() {
        let dairy = Arc::new(setup());
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let dairy = dairy.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| dairy.record_sale(sale(cheese, 7, 3)).is_ok())
                        .count()
                })
            })
            .collect();
        let sold: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(sold, 14);
        assert_eq!(dairy.sales().len(), 14);
        assert_eq!(on_hand(&dairy, cheese), Decimal::from(2));
        assert!(dairy.audit_stock().unwrap().is_empty());
    }

    #[test]
    fn milk_intake_does_not_touch_stock() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let collection = dairy
            .record_milk_collection(MilkCollectionInput {
                date: day(2),
                source: MilkSource::Farm,
                quantity_liters: Quantity::from(1000),
                fat_content: None,
                collected_by: None,
            })
            .unwrap();

        let separation = dairy
            .record_milk_separation(MilkSeparationInput {
                date: day(2),
                milk_collection_id: collection.id,
                milk_used_liters: Quantity::from(600),
                cream_liters: Some(Quantity::from(60)),
                skimmed_milk_liters: Some(Quantity::from(540)),
                whole_milk_liters: None,
            })
            .unwrap();

        assert_eq!(on_hand(&dairy, cheese), Decimal::ZERO);
        assert!(matches!(
            dairy.delete_milk_collection(collection.id),
            Err(DomainError::Validation(_))
        ));

        let mut shrink = MilkCollectionInput {
            date: day(2),
            source: MilkSource::Farm,
            quantity_liters: Quantity::from(500),
            fat_content: None,
            collected_by: None,
        };
        assert!(dairy.edit_milk_collection(collection.id, shrink.clone()).is_err());
        shrink.quantity_liters = Quantity::from(800);
        dairy.edit_milk_collection(collection.id, shrink).unwrap();

        dairy.delete_milk_separation(separation.id).unwrap();
        dairy.delete_milk_collection(collection.id).unwrap();
        assert!(dairy.milk_collections().is_empty());
        assert!(dairy.milk_separations().is_empty());
    }

    #[test]
    fn separation_requires_existing_collection() {
        let dairy = setup();
        let err = dairy
            .record_milk_separation(MilkSeparationInput {
                date: day(2),
                milk_collection_id: MilkCollectionId::new(),
                milk_used_liters: Quantity::from(10),
                cream_liters: None,
                skimmed_milk_liters: None,
                whole_milk_liters: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn stock_levels_list_lowest_stock_first() {
        let dairy = setup();
        let butter = add_product(&dairy, "Butter", None).id_typed();
        let cheese = add_product(&dairy, "Cheese", None).id_typed();
        let yogurt = add_product(&dairy, "Yogurt", None).id_typed();
        let ghee = add_product(&dairy, "Ghee", None).id_typed();
        dairy.record_production(production(butter, 50, 2)).unwrap();
        dairy.record_production(production(cheese, 5, 2)).unwrap();
        dairy.record_production(production(yogurt, 20, 2)).unwrap();

        let order: Vec<ProductId> = dairy
            .stock_levels()
            .unwrap()
            .iter()
            .map(|level| level.product.id_typed())
            .collect();

        assert_eq!(order, vec![ghee, cheese, yogurt, butter]);
    }

    #[test]
    fn moving_production_to_another_product() {
        let dairy = setup();
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        let butter = add_product(&dairy, "Butter", Some(20)).id_typed();
        let run = dairy.record_production(production(cheese, 1000, 2)).unwrap();

        let moved = dairy.edit_production(run.id, production(butter, 1000, 3)).unwrap();

        assert_eq!(moved.id, run.id);
        assert_eq!(moved.quantity_produced, Quantity::from(50));
        assert_eq!(on_hand(&dairy, cheese), Decimal::ZERO);
        assert_eq!(on_hand(&dairy, butter), Decimal::from(50));
        assert_eq!(dairy.stock(cheese).unwrap().last_updated, Some(day(3)));

        let stored = dairy.production(run.id).unwrap();
        assert_eq!(stored.product_id, butter);
        assert_eq!(stored.quantity_produced, Quantity::from(50));
        assert_eq!(dairy.productions().len(), 1);
        assert!(dairy.audit_stock().unwrap().is_empty());
    }

    /// Sales history whose reads can be held at an earlier row, the way a
    /// second editor sees a sale it loaded before someone else saved.
    struct HeldReads {
        inner: InMemoryEntryStore<EntryId, SaleEntry>,
        held: Mutex<Option<SaleEntry>>,
    }

    impl HeldReads {
        fn hold(&self, row: SaleEntry) {
            *self.held.lock().unwrap() = Some(row);
        }
    }

    impl EntryStore<EntryId, SaleEntry> for HeldReads {
        fn get(&self, key: &EntryId) -> Option<SaleEntry> {
            match self.held.lock().unwrap().clone() {
                Some(row) if row.id == *key => Some(row),
                _ => self.inner.get(key),
            }
        }

        fn replace(
            &self,
            key: EntryId,
            expected: Option<&SaleEntry>,
            new: Option<SaleEntry>,
        ) -> DomainResult<()> {
            self.inner.replace(key, expected, new)
        }

        fn list(&self) -> Vec<SaleEntry> {
            self.inner.list()
        }
    }

    #[test]
    fn edit_from_a_stale_read_conflicts_without_touching_stock() {
        let sales = Arc::new(HeldReads {
            inner: InMemoryEntryStore::new(),
            held: Mutex::new(None),
        });
        let stores = Stores {
            sales: sales.clone(),
            ..Stores::in_memory()
        };
        let dairy = DairyLedger::new(
            CatalogConfig::default(),
            stores,
            InMemoryStockStore::new(),
            InMemoryEventBus::<LedgerEvent>::new(),
        );

        let cheese = dairy
            .create_product(ProductDraft::new("Cheese", "kg").with_ratio(Quantity::from(10)), day(1))
            .unwrap()
            .id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();

        // The second editor loaded the sale at 30 before the first saved 10.
        sales.hold(sold.clone());
        dairy.edit_sale(sold.id, sale(cheese, 10, 4)).unwrap();
        let balance_before = dairy.stock(cheese).unwrap();
        assert_eq!(balance_before.current_quantity, Decimal::from(90));

        let edit = dairy.edit_sale(sold.id, sale(cheese, 50, 5)).unwrap_err();
        let delete = dairy.delete_sale(sold.id, day(5)).unwrap_err();

        assert!(matches!(edit, DomainError::Conflict(_)));
        assert!(matches!(delete, DomainError::Conflict(_)));
        assert_eq!(dairy.stock(cheese).unwrap(), balance_before);
        assert_eq!(dairy.sales()[0].quantity, Quantity::from(10));
        assert!(dairy.audit_stock().unwrap().is_empty());
    }

    #[test]
    fn concurrent_edits_of_one_sale_keep_stock_consistent() {
        let dairy = Arc::new(setup());
        let cheese = add_product(&dairy, "Cheese", Some(10)).id_typed();
        dairy.record_production(production(cheese, 1000, 2)).unwrap();
        let sold = dairy.record_sale(sale(cheese, 30, 3)).unwrap();
        let start = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (1..=8)
            .map(|quantity| {
                let dairy = dairy.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    dairy.edit_sale(sold.id, sale(cheese, quantity, 4))
                })
            })
            .collect();

        let mut saved = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => saved += 1,
                Err(DomainError::Conflict(_)) => {}
                Err(other) => panic!("unexpected edit failure: {other:?}"),
            }
        }

        assert!(saved >= 1);
        let final_sale = dairy.sale(sold.id).unwrap();
        assert_eq!(
            on_hand(&dairy, cheese),
            Decimal::from(100) - final_sale.quantity.as_decimal()
        );
        assert!(dairy.audit_stock().unwrap().is_empty());
    }

    #[test]
    fn separations_together_cannot_exceed_their_collection() {
        let dairy = setup();
        let collection = dairy.record_milk_collection(collection_input(1000)).unwrap();

        let first = dairy
            .record_milk_separation(separation_input(collection.id, 800))
            .unwrap();
        let err = dairy
            .record_milk_separation(separation_input(collection.id, 800))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        dairy
            .record_milk_separation(separation_input(collection.id, 200))
            .unwrap();

        // Editing a separation only counts the others against the collection.
        dairy
            .edit_milk_separation(first.id, separation_input(collection.id, 700))
            .unwrap();
        assert!(
            dairy
                .edit_milk_separation(first.id, separation_input(collection.id, 900))
                .is_err()
        );

        // 700 + 200 liters are in use.
        assert!(dairy.edit_milk_collection(collection.id, collection_input(850)).is_err());
        dairy
            .edit_milk_collection(collection.id, collection_input(900))
            .unwrap();
        assert_eq!(dairy.milk_separations().len(), 2);
    }

    #[test]
    fn concurrent_separations_never_overdraw_a_collection() {
        let dairy = Arc::new(setup());
        let collection = dairy.record_milk_collection(collection_input(1000)).unwrap();
        let start = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dairy = dairy.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    dairy
                        .record_milk_separation(separation_input(collection.id, 300))
                        .is_ok()
                })
            })
            .collect();
        let recorded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(recorded, 3);
        let used: Decimal = dairy
            .milk_separations()
            .iter()
            .map(|s| s.milk_used_liters.as_decimal())
            .sum();
        assert_eq!(used, Decimal::from(900));
    }

    #[test]
    fn separation_racing_collection_delete_never_dangles() {
        let dairy = Arc::new(setup());

        for _ in 0..50 {
            let collection = dairy.record_milk_collection(collection_input(100)).unwrap();
            let start = Arc::new(Barrier::new(2));

            let deleter = {
                let dairy = dairy.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    dairy.delete_milk_collection(collection.id).is_ok()
                })
            };
            let separator = {
                let dairy = dairy.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    dairy
                        .record_milk_separation(separation_input(collection.id, 10))
                        .is_ok()
                })
            };

            let deleted = deleter.join().unwrap();
            let separated = separator.join().unwrap();
            assert_ne!(deleted, separated);
        }

        let collections: Vec<MilkCollectionId> =
            dairy.milk_collections().iter().map(|c| c.id).collect();
        for separation in dairy.milk_separations() {
            assert!(collections.contains(&separation.milk_collection_id));
        }
    }

    #[derive(Debug, Clone)]
    enum Action {
        Produce(u32),
        Sell(u32),
        EditSale(usize, u32),
        DeleteSale(usize),
        DeleteProduction(usize),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (1u32..2_000).prop_map(Action::Produce),
            (1u32..150).prop_map(Action::Sell),
            (0usize..8, 1u32..150).prop_map(|(i, q)| Action::EditSale(i, q)),
            (0usize..8).prop_map(Action::DeleteSale),
            (0usize..8).prop_map(Action::DeleteProduction),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: after any mix of record/edit/delete, every balance equals
        /// the fold of the surviving entries.
        #[test]
        fn balance_always_matches_history(actions in prop::collection::vec(action(), 1..40)) {
            let dairy = setup();
            let cheese = add_product(&dairy, "Cheese", Some(3)).id_typed();

            for action in actions {
                let _ = match action {
                    Action::Produce(milk) => dairy.record_production(production(cheese, milk, 2)).map(|_| ()),
                    Action::Sell(q) => dairy.record_sale(sale(cheese, q, 3)).map(|_| ()),
                    Action::EditSale(i, q) => match dairy.sales().get(i) {
                        Some(s) => dairy.edit_sale(s.id, sale(cheese, q, 4)).map(|_| ()),
                        None => Ok(()),
                    },
                    Action::DeleteSale(i) => match dairy.sales().get(i) {
                        Some(s) => dairy.delete_sale(s.id, day(5)).map(|_| ()),
                        None => Ok(()),
                    },
                    Action::DeleteProduction(i) => match dairy.productions().get(i) {
                        Some(p) => dairy.delete_production(p.id, day(5)).map(|_| ()),
                        None => Ok(()),
                    },
                };

                prop_assert_eq!(on_hand(&dairy, cheese), dairy.folded_quantity(cheese).unwrap());
            }
            prop_assert!(dairy.audit_stock().unwrap().is_empty());
        }
    }
}
