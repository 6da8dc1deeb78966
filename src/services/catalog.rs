//! Products, categories and suppliers.
//!
//! Product writes never carry a stock level; a new product starts at zero and
//! only the inventory adjustment moves it.

use tracing::instrument;
use validator::Validate;

use crate::domain::aggregates::{Category, CategoryInput, Product, ProductInput, Supplier, SupplierInput};
use crate::store::{Store, StoreTx};
use crate::{Result, WarehouseError};

#[derive(Clone)]
pub struct CatalogService<S> { store: S }

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self { Self { store } }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub async fn list_products(&self) -> Result<Vec<Product>> { self.store.list_products().await }

    pub async fn get_product(&self, id: i64) -> Result<Product> {
        self.store.find_product(id).await?.ok_or(WarehouseError::NotFound("Product"))
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let input = input.normalized()?;
        let mut tx = self.store.begin().await?;
        let id = tx.insert_product(&input).await?;
        tx.commit().await?;
        tracing::info!(product_id = id, sku = %input.sku, "product created");
        self.get_product(id).await
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn update_product(&self, id: i64, input: ProductInput) -> Result<Product> {
        let input = input.normalized()?;
        let mut tx = self.store.begin().await?;
        if tx.update_product(id, &input).await? == 0 {
            return Err(WarehouseError::NotFound("Product"));
        }
        tx.commit().await?;
        tracing::info!(product_id = id, "product updated");
        self.get_product(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let references = tx.product_references(id).await?;
        if references > 0 {
            return Err(WarehouseError::conflict(format!("product is referenced by {references} order items or stock movements")));
        }
        if tx.delete_product(id).await? == 0 {
            return Err(WarehouseError::NotFound("Product"));
        }
        tx.commit().await?;
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self) -> Result<Vec<Category>> { self.store.list_categories().await }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        self.store.find_category(id).await?.ok_or(WarehouseError::NotFound("Category"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let id = tx.insert_category(&input).await?;
        tx.commit().await?;
        tracing::info!(category_id = id, "category created");
        self.get_category(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(&self, id: i64, input: CategoryInput) -> Result<Category> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        if tx.update_category(id, &input).await? == 0 {
            return Err(WarehouseError::NotFound("Category"));
        }
        tx.commit().await?;
        self.get_category(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.category_product_count(id).await? > 0 {
            return Err(WarehouseError::conflict("category still contains products"));
        }
        if tx.delete_category(id).await? == 0 {
            return Err(WarehouseError::NotFound("Category"));
        }
        tx.commit().await?;
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>> { self.store.list_suppliers().await }

    pub async fn get_supplier(&self, id: i64) -> Result<Supplier> {
        self.store.find_supplier(id).await?.ok_or(WarehouseError::NotFound("Supplier"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(&self, input: SupplierInput) -> Result<Supplier> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let id = tx.insert_supplier(&input).await?;
        tx.commit().await?;
        tracing::info!(supplier_id = id, "supplier created");
        self.get_supplier(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_supplier(&self, id: i64, input: SupplierInput) -> Result<Supplier> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        if tx.update_supplier(id, &input).await? == 0 {
            return Err(WarehouseError::NotFound("Supplier"));
        }
        tx.commit().await?;
        self.get_supplier(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let references = tx.supplier_references(id).await?;
        if references > 0 {
            return Err(WarehouseError::conflict(format!("supplier is referenced by {references} orders or invoices")));
        }
        if tx.delete_supplier(id).await? == 0 {
            return Err(WarehouseError::NotFound("Supplier"));
        }
        tx.commit().await?;
        tracing::info!(supplier_id = id, "supplier deleted");
        Ok(())
    }
}
