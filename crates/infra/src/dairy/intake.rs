use rust_decimal::Decimal;

use dairyledger_core::{DomainError, DomainResult, MilkCollectionId, MilkSeparationId};
use dairyledger_events::EventBus;
use dairyledger_ledger::{
    LedgerEvent, MilkCollection, MilkCollectionInput, MilkSeparation, MilkSeparationInput,
    total_liters,
};
use dairyledger_stock::StockStore;

use super::DairyLedger;

// Every write touching a collection or its separations runs under that
// collection's intake lock, so checks over the set of separations hold until
// the write lands.
impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    pub fn record_milk_collection(&self, input: MilkCollectionInput) -> DomainResult<MilkCollection> {
        let collection = MilkCollection::new(MilkCollectionId::new(), input)?;
        self.stores
            .collections
            .replace(collection.id, None, Some(collection.clone()))?;

        tracing::info!(
            collection_id = %collection.id,
            liters = %collection.quantity_liters,
            "milk collection recorded"
        );
        Ok(collection)
    }

    /// Edit a collection; it must still cover the milk its separations use.
    pub fn edit_milk_collection(
        &self,
        collection_id: MilkCollectionId,
        input: MilkCollectionInput,
    ) -> DomainResult<MilkCollection> {
        let collection = self.intake_locks.with(&[collection_id], || {
            let previous = self.existing_collection(collection_id)?;
            let collection = MilkCollection::new(collection_id, input)?;

            let drawn = self.milk_drawn_from(collection_id, None)?;
            if drawn > collection.quantity_liters.as_decimal() {
                return Err(DomainError::validation(format!(
                    "separations already use {drawn} liters from this collection"
                )));
            }

            self.stores
                .collections
                .replace(collection_id, Some(&previous), Some(collection.clone()))?;
            Ok(collection)
        })?;

        tracing::info!(%collection_id, "milk collection revised");
        Ok(collection)
    }

    /// Delete a collection that no separation references.
    pub fn delete_milk_collection(&self, collection_id: MilkCollectionId) -> DomainResult<MilkCollection> {
        let previous = self.intake_locks.with(&[collection_id], || {
            let previous = self.existing_collection(collection_id)?;

            let referencing = self.separations_of(collection_id).len();
            if referencing > 0 {
                return Err(DomainError::validation(format!(
                    "milk collection {collection_id} is referenced by {referencing} separations"
                )));
            }

            self.stores
                .collections
                .replace(collection_id, Some(&previous), None)?;
            Ok(previous)
        })?;

        tracing::info!(%collection_id, "milk collection deleted");
        Ok(previous)
    }

    pub fn milk_collections(&self) -> Vec<MilkCollection> {
        self.stores.collections.list()
    }

    pub fn record_milk_separation(&self, input: MilkSeparationInput) -> DomainResult<MilkSeparation> {
        let collection_id = input.milk_collection_id;
        let separation = self.intake_locks.with(&[collection_id], || {
            let collection = self.existing_collection(collection_id)?;
            let drawn = self.milk_drawn_from(collection_id, None)?;
            let separation =
                MilkSeparation::new(MilkSeparationId::new(), input, &collection, drawn)?;

            self.stores
                .separations
                .replace(separation.id, None, Some(separation.clone()))?;
            Ok(separation)
        })?;

        tracing::info!(
            separation_id = %separation.id,
            %collection_id,
            liters = %separation.milk_used_liters,
            "milk separation recorded"
        );
        Ok(separation)
    }

    /// Edit a separation, possibly moving it to another collection.
    pub fn edit_milk_separation(
        &self,
        separation_id: MilkSeparationId,
        input: MilkSeparationInput,
    ) -> DomainResult<MilkSeparation> {
        let previous = self.existing_separation(separation_id)?;
        let target = input.milk_collection_id;

        let separation = self
            .intake_locks
            .with(&[previous.milk_collection_id, target], || {
                let collection = self.existing_collection(target)?;
                let drawn = self.milk_drawn_from(target, Some(separation_id))?;
                let separation = MilkSeparation::new(separation_id, input, &collection, drawn)?;

                self.stores
                    .separations
                    .replace(separation_id, Some(&previous), Some(separation.clone()))?;
                Ok(separation)
            })?;

        tracing::info!(%separation_id, collection_id = %target, "milk separation revised");
        Ok(separation)
    }

    pub fn delete_milk_separation(&self, separation_id: MilkSeparationId) -> DomainResult<MilkSeparation> {
        let previous = self.existing_separation(separation_id)?;

        self.intake_locks.with(&[previous.milk_collection_id], || {
            self.stores
                .separations
                .replace(separation_id, Some(&previous), None)
        })?;

        tracing::info!(%separation_id, "milk separation deleted");
        Ok(previous)
    }

    pub fn milk_separations(&self) -> Vec<MilkSeparation> {
        self.stores.separations.list()
    }

    fn existing_collection(&self, collection_id: MilkCollectionId) -> DomainResult<MilkCollection> {
        self.stores
            .collections
            .get(&collection_id)
            .ok_or_else(|| DomainError::not_found(format!("milk collection {collection_id}")))
    }

    fn existing_separation(&self, separation_id: MilkSeparationId) -> DomainResult<MilkSeparation> {
        self.stores
            .separations
            .get(&separation_id)
            .ok_or_else(|| DomainError::not_found(format!("milk separation {separation_id}")))
    }

    fn separations_of(&self, collection_id: MilkCollectionId) -> Vec<MilkSeparation> {
        self.stores
            .separations
            .list()
            .into_iter()
            .filter(|s| s.milk_collection_id == collection_id)
            .collect()
    }

    /// Milk used by the collection's separations, leaving out `except`.
    fn milk_drawn_from(
        &self,
        collection_id: MilkCollectionId,
        except: Option<MilkSeparationId>,
    ) -> DomainResult<Decimal> {
        total_liters(
            self.separations_of(collection_id)
                .into_iter()
                .filter(|s| Some(s.id) != except)
                .map(|s| s.milk_used_liters.as_decimal()),
        )
    }
}
