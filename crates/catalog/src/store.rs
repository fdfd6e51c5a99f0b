use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dairyledger_core::ProductId;

use crate::product::Product;

/// Catalog storage abstraction.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, product_id: &ProductId) -> Option<Product>;
    fn upsert(&self, product: Product);
    fn remove(&self, product_id: &ProductId) -> Option<Product>;
    /// All products, ordered by name.
    fn list(&self) -> Vec<Product>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn get(&self, product_id: &ProductId) -> Option<Product> {
        (**self).get(product_id)
    }

    fn upsert(&self, product: Product) {
        (**self).upsert(product)
    }

    fn remove(&self, product_id: &ProductId) -> Option<Product> {
        (**self).remove(product_id)
    }

    fn list(&self) -> Vec<Product> {
        (**self).list()
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, product_id: &ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(product_id).cloned()
    }

    fn upsert(&self, product: Product) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(product.id_typed(), product);
        }
    }

    fn remove(&self, product_id: &ProductId) -> Option<Product> {
        let mut map = self.inner.write().ok()?;
        map.remove(product_id)
    }

    fn list(&self) -> Vec<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(|a, b| a.name().cmp(b.name()));
        products
    }
}
