//! Milk intake records: collections from the farm or suppliers, and separation
//! of collected milk into cream, skimmed and whole milk.
//!
//! These records document where the milk went; they never touch stock balances.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dairyledger_core::{
    DomainError, DomainResult, EmployeeId, Entity, MilkCollectionId, MilkSeparationId, Quantity,
    SupplierId,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "supplier_id", rename_all = "lowercase")]
pub enum MilkSource {
    Farm,
    Supplier(SupplierId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilkCollectionInput {
    pub date: NaiveDate,
    pub source: MilkSource,
    pub quantity_liters: Quantity,
    /// Fat percentage, if measured.
    pub fat_content: Option<Quantity>,
    pub collected_by: Option<EmployeeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilkCollection {
    pub id: MilkCollectionId,
    pub date: NaiveDate,
    pub source: MilkSource,
    pub quantity_liters: Quantity,
    pub fat_content: Option<Quantity>,
    pub collected_by: Option<EmployeeId>,
}

impl MilkCollection {
    pub fn new(id: MilkCollectionId, input: MilkCollectionInput) -> DomainResult<Self> {
        if let Some(fat) = input.fat_content {
            if fat.as_decimal() > Decimal::ONE_HUNDRED {
                return Err(DomainError::validation(format!(
                    "fat content {fat}% exceeds 100%"
                )));
            }
        }

        Ok(Self {
            id,
            date: input.date,
            source: input.source,
            quantity_liters: input.quantity_liters,
            fat_content: input.fat_content,
            collected_by: input.collected_by,
        })
    }
}

impl Entity for MilkCollection {
    type Id = MilkCollectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilkSeparationInput {
    pub date: NaiveDate,
    pub milk_collection_id: MilkCollectionId,
    pub milk_used_liters: Quantity,
    pub cream_liters: Option<Quantity>,
    pub skimmed_milk_liters: Option<Quantity>,
    pub whole_milk_liters: Option<Quantity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilkSeparation {
    pub id: MilkSeparationId,
    pub date: NaiveDate,
    pub milk_collection_id: MilkCollectionId,
    pub milk_used_liters: Quantity,
    pub cream_liters: Option<Quantity>,
    pub skimmed_milk_liters: Option<Quantity>,
    pub whole_milk_liters: Option<Quantity>,
}

impl MilkSeparation {
    /// Validate a separation against the collection it draws from.
    ///
    /// `drawn_elsewhere` is the milk already used by the collection's other
    /// separations; together they may not exceed the collected quantity.
    pub fn new(
        id: MilkSeparationId,
        input: MilkSeparationInput,
        collection: &MilkCollection,
        drawn_elsewhere: Decimal,
    ) -> DomainResult<Self> {
        if collection.id != input.milk_collection_id {
            return Err(DomainError::validation("milk_collection_id mismatch"));
        }
        let drawn = total_liters([drawn_elsewhere, input.milk_used_liters.as_decimal()])?;
        if drawn > collection.quantity_liters.as_decimal() {
            return Err(DomainError::validation(format!(
                "separations would use {drawn} liters but collection {} has {}",
                collection.id, collection.quantity_liters
            )));
        }

        let outputs = total_liters(
            [
                input.cream_liters,
                input.skimmed_milk_liters,
                input.whole_milk_liters,
            ]
            .into_iter()
            .flatten()
            .map(|q| q.as_decimal()),
        )?;
        if outputs > input.milk_used_liters.as_decimal() {
            return Err(DomainError::validation(format!(
                "separated outputs ({outputs} liters) exceed milk used ({})",
                input.milk_used_liters
            )));
        }

        Ok(Self {
            id,
            date: input.date,
            milk_collection_id: input.milk_collection_id,
            milk_used_liters: input.milk_used_liters,
            cream_liters: input.cream_liters,
            skimmed_milk_liters: input.skimmed_milk_liters,
            whole_milk_liters: input.whole_milk_liters,
        })
    }
}

/// Sum of liter amounts; `InvalidQuantity` when it is out of range.
pub fn total_liters(liters: impl IntoIterator<Item = Decimal>) -> DomainResult<Decimal> {
    liters.into_iter().try_fold(Decimal::ZERO, |total, l| {
        total
            .checked_add(l)
            .ok_or_else(|| DomainError::invalid_quantity("total liters out of range"))
    })
}

impl Entity for MilkSeparation {
    type Id = MilkSeparationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 21).unwrap()
    }

    fn collection(liters: u32) -> MilkCollection {
        MilkCollection::new(
            MilkCollectionId::new(),
            MilkCollectionInput {
                date: test_date(),
                source: MilkSource::Farm,
                quantity_liters: Quantity::from(liters),
                fat_content: Some("3.5".parse().unwrap()),
                collected_by: None,
            },
        )
        .unwrap()
    }

    fn separation_input(collection: &MilkCollection, used: u32, cream: u32) -> MilkSeparationInput {
        MilkSeparationInput {
            date: test_date(),
            milk_collection_id: collection.id,
            milk_used_liters: Quantity::from(used),
            cream_liters: Some(Quantity::from(cream)),
            skimmed_milk_liters: Some(Quantity::from(used - cream)),
            whole_milk_liters: None,
        }
    }

    #[test]
    fn fat_content_above_one_hundred_percent_is_rejected() {
        let err = MilkCollection::new(
            MilkCollectionId::new(),
            MilkCollectionInput {
                date: test_date(),
                source: MilkSource::Supplier(SupplierId::new()),
                quantity_liters: Quantity::from(10),
                fat_content: Some(Quantity::from(101)),
                collected_by: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn separation_within_collection_is_accepted() {
        let col = collection(1000);
        let sep = MilkSeparation::new(
            MilkSeparationId::new(),
            separation_input(&col, 400, 40),
            &col,
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(sep.milk_used_liters, Quantity::from(400));
        assert_eq!(sep.skimmed_milk_liters, Some(Quantity::from(360)));
    }

    #[test]
    fn separation_cannot_use_more_than_collected() {
        let col = collection(100);
        let err = MilkSeparation::new(
            MilkSeparationId::new(),
            separation_input(&col, 150, 10),
            &col,
            Decimal::ZERO,
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("would use 150") => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn milk_drawn_by_other_separations_counts_against_collection() {
        let col = collection(1000);

        let fits = MilkSeparation::new(
            MilkSeparationId::new(),
            separation_input(&col, 200, 20),
            &col,
            Decimal::from(800),
        );
        assert!(fits.is_ok());

        let err = MilkSeparation::new(
            MilkSeparationId::new(),
            separation_input(&col, 800, 80),
            &col,
            Decimal::from(800),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("would use 1600") => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_liter_totals_are_invalid() {
        let err = total_liters([Decimal::MAX, Decimal::MAX]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity(_)));
    }

    #[test]
    fn separated_outputs_cannot_exceed_input() {
        let col = collection(100);
        let mut input = separation_input(&col, 50, 10);
        input.whole_milk_liters = Some(Quantity::from(5));
        let err = MilkSeparation::new(MilkSeparationId::new(), input, &col, Decimal::ZERO).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("exceed milk used") => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
