//! Product catalog: insertion, listing and name search.

use common::{NewProduct, Product, ProductId};
use document_store::{DocumentStore, ProductFilter};

use crate::error::{CommerceError, Result};
use crate::settings::EngineSettings;
use crate::store_call::StoreGateway;

/// Highest rating a product may carry.
pub const MAX_RATING: u8 = 5;

#[derive(Clone)]
pub struct CatalogService<S> {
    gateway: StoreGateway<S>,
}

impl<S: DocumentStore + Clone> CatalogService<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            gateway: StoreGateway::new(store, settings),
        }
    }

    /// Validates and stores a product under a fresh id.
    #[tracing::instrument(skip(self, new_product), fields(name = %new_product.product_name))]
    pub async fn add_product(&self, new_product: NewProduct) -> Result<Product> {
        validate(&new_product)?;

        let mut product = new_product.into_product(ProductId::new());
        product.product_name = product.product_name.trim().to_string();
        self.gateway.insert_product(product.clone()).await?;

        tracing::info!(product_id = %product.product_id, price = %product.price, "product added");
        Ok(product)
    }

    /// Every product, in insertion order.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.gateway.list_products(ProductFilter::new()).await
    }

    /// Products whose name contains `fragment`, ignoring case.
    pub async fn search_products(&self, fragment: &str) -> Result<Vec<Product>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(CommerceError::InvalidInput(
                "search term must not be empty".to_string(),
            ));
        }
        self.gateway
            .list_products(ProductFilter::new().name_contains(fragment))
            .await
    }
}

fn validate(product: &NewProduct) -> Result<()> {
    if product.product_name.trim().is_empty() {
        return Err(CommerceError::InvalidInput(
            "product name must not be empty".to_string(),
        ));
    }
    if product.price.is_negative() {
        return Err(CommerceError::InvalidInput(format!(
            "price must not be negative, got {}",
            product.price
        )));
    }
    if let Some(rating) = product.rating
        && rating > MAX_RATING
    {
        return Err(CommerceError::InvalidInput(format!(
            "rating must be between 0 and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}
