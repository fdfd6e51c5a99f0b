use serde::{Deserialize, Serialize};

use dairyledger_core::{DomainError, DomainResult, Entity, ProductId, Quantity};

/// Catalog fields as submitted by the add/edit product form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: Option<String>,
    /// Liters of milk consumed per unit produced. `None` or zero means 1:1.
    pub ratio_to_milk: Option<Quantity>,
    pub unit: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_ratio(mut self, ratio_to_milk: Quantity) -> Self {
        self.ratio_to_milk = Some(ratio_to_milk);
        self
    }

    /// Parse the optional ratio form field; blank means "no ratio".
    pub fn parse_ratio(raw: &str) -> DomainResult<Option<Quantity>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: Option<String>,
    ratio_to_milk: Option<Quantity>,
    unit: String,
}

impl Product {
    /// Validate a draft into a product. A blank unit falls back to `default_unit`.
    pub fn create(id: ProductId, draft: ProductDraft, default_unit: &str) -> DomainResult<Self> {
        let mut product = Self {
            id,
            name: String::new(),
            category: None,
            ratio_to_milk: None,
            unit: String::new(),
        };
        product.revise(draft, default_unit)?;
        Ok(product)
    }

    /// Replace the catalog fields.
    ///
    /// Changing the ratio only affects production recorded afterwards; stored
    /// ledger deltas are never recomputed.
    pub fn revise(&mut self, draft: ProductDraft, default_unit: &str) -> DomainResult<()> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        let unit = match draft.unit.trim() {
            "" => default_unit.trim(),
            unit => unit,
        };

        self.name = name.to_string();
        self.category = draft
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.ratio_to_milk = draft.ratio_to_milk;
        self.unit = unit.to_string();
        Ok(())
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn ratio_to_milk(&self) -> Option<Quantity> {
        self.ratio_to_milk
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
