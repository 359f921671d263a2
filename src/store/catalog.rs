//! Products and categories.

use serde::{Deserialize, Serialize};

use crate::store::{Database, Money, StoreError};

/// A product category. Categories may nest one level via `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// A product for sale. `price` is in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub category_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

/// Newest first. Ids are assigned in creation order.
fn newest_first(mut products: Vec<Product>, limit: Option<usize>) -> Vec<Product> {
    products.sort_by(|a, b| b.id.cmp(&a.id));
    if let Some(limit) = limit {
        products.truncate(limit);
    }
    products
}

impl Database {
    /// All products, newest first.
    pub fn products(&self, limit: Option<usize>) -> Result<Vec<Product>, StoreError> {
        let tables = self.read()?;
        Ok(newest_first(tables.products.clone(), limit))
    }

    pub fn product(&self, id: u64) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.product(id).cloned())
    }

    pub fn products_in_category(&self, category_id: u64) -> Result<Vec<Product>, StoreError> {
        let tables = self.read()?;
        let matching = tables
            .products
            .iter()
            .filter(|p| p.category_id == Some(category_id))
            .cloned()
            .collect();
        Ok(newest_first(matching, None))
    }

    /// Case-insensitive substring search over name and description.
    pub fn search_products(&self, term: &str, limit: Option<usize>) -> Result<Vec<Product>, StoreError> {
        let needle = term.to_lowercase();
        let tables = self.read()?;
        let matching = tables
            .products
            .iter()
            .filter(|p| p.mentions(&needle))
            .cloned()
            .collect();
        Ok(newest_first(matching, limit))
    }

    pub fn product_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.products.len())
    }

    /// All categories sorted by name.
    pub fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.read()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub fn category(&self, id: u64) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.iter().find(|c| c.id == id).cloned())
    }

    pub fn subcategories(&self, parent_id: u64) -> Result<Vec<Category>, StoreError> {
        let mut children: Vec<Category> = self
            .read()?
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::fixtures;

    #[test]
    fn test_products_newest_first_with_limit() {
        let db = fixtures::database();
        let ids: Vec<u64> = db.products(None).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        assert_eq!(db.products(Some(2)).unwrap().len(), 2);
        assert_eq!(db.product_count().unwrap(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let db = fixtures::database();
        let hits = db.search_products("RUST", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Rust Book");

        let by_description = db.search_products("fine", Some(3)).unwrap();
        assert_eq!(by_description.len(), 3);
    }

    #[test]
    fn test_categories() {
        let db = fixtures::database();
        let names: Vec<String> = db.categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Books", "Electronics", "Headphones"]);
        assert_eq!(db.subcategories(1).unwrap().len(), 1);
        assert!(db.category(99).unwrap().is_none());
        assert_eq!(db.products_in_category(2).unwrap().len(), 2);
    }
}
