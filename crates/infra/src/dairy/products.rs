use chrono::NaiveDate;

use dairyledger_catalog::{Product, ProductDraft};
use dairyledger_core::{DomainError, DomainResult, ProductId};
use dairyledger_events::EventBus;
use dairyledger_ledger::LedgerEvent;
use dairyledger_stock::{Balance, StockStore};

use super::DairyLedger;

impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    /// Add a product to the catalog and open its zero balance.
    pub fn create_product(&self, draft: ProductDraft, date: NaiveDate) -> DomainResult<Product> {
        let product = Product::create(ProductId::new(), draft, &self.catalog_config.default_unit)?;
        let product_id = product.id_typed();

        self.engine.store().initialize(product_id, date)?;
        self.stores.catalog.upsert(product.clone());

        tracing::info!(%product_id, name = product.name(), "product created");
        self.publish(LedgerEvent::ProductCreated {
            product_id,
            occurred_on: date,
        });
        Ok(product)
    }

    /// Edit catalog fields. Recorded entries keep the quantities they were
    /// derived with; a new ratio only affects later production.
    pub fn update_product(&self, product_id: ProductId, draft: ProductDraft) -> DomainResult<Product> {
        let mut product = self.product(product_id)?;
        product.revise(draft, &self.catalog_config.default_unit)?;
        self.stores.catalog.upsert(product.clone());

        tracing::info!(%product_id, name = product.name(), "product updated");
        Ok(product)
    }

    /// Remove a product and its balance.
    ///
    /// Refused while any production or sale still references the product, since
    /// those entries could no longer be retracted.
    pub fn delete_product(&self, product_id: ProductId, date: NaiveDate) -> DomainResult<Balance> {
        let balance = self.engine.store().transact(&[product_id], |tx| {
            let referencing = self.entries_for(product_id);
            if referencing > 0 {
                return Err(DomainError::validation(format!(
                    "product {product_id} is referenced by {referencing} ledger entries"
                )));
            }
            self.stores
                .catalog
                .remove(&product_id)
                .ok_or(DomainError::MissingProduct(product_id))?;
            Ok(tx.balance(product_id)?.clone())
        })?;
        self.engine.store().remove(product_id)?;

        tracing::info!(%product_id, quantity = %balance.current_quantity, "product deleted");
        self.publish(LedgerEvent::ProductDeleted {
            product_id,
            final_quantity: balance.current_quantity,
            occurred_on: date,
        });
        Ok(balance)
    }

    pub fn get_product(&self, product_id: ProductId) -> Option<Product> {
        self.stores.catalog.get(&product_id)
    }

    pub fn products(&self) -> Vec<Product> {
        self.stores.catalog.list()
    }

    fn entries_for(&self, product_id: ProductId) -> usize {
        let productions = self
            .stores
            .productions
            .list()
            .into_iter()
            .filter(|e| e.product_id == product_id)
            .count();
        let sales = self
            .stores
            .sales
            .list()
            .into_iter()
            .filter(|e| e.product_id == product_id)
            .count();
        productions + sales
    }
}
