//! In-memory product collection.
//!
//! The list is a cached projection of the server's catalog: `load` replaces
//! it wholesale and each mutation patches it with the record the server
//! returns. It is never authoritative.
//!
//! Every operation propagates API failures to the caller except
//! [`ProductCache::upload_image`], which only logs them.

use cafe_catalog_core::{Category, CategoryId, Product, ProductDraft, ProductId};
use tracing::{debug, info, instrument, warn};

use crate::api::{CafeApi, ImageAsset};
use crate::config::DEFAULT_PRODUCT_LIMIT;
use crate::error::ApiError;

/// Cached product list backed by the catalog API.
#[derive(Debug, Clone)]
pub struct ProductCache {
    api: CafeApi,
    products: Vec<Product>,
    default_limit: u32,
}

impl ProductCache {
    /// Empty cache using the default refresh limit.
    #[must_use]
    pub const fn new(api: CafeApi) -> Self {
        Self::with_limit(api, DEFAULT_PRODUCT_LIMIT)
    }

    /// Empty cache refreshing up to `default_limit` products.
    #[must_use]
    pub const fn with_limit(api: CafeApi, default_limit: u32) -> Self {
        Self {
            api,
            products: Vec::new(),
            default_limit,
        }
    }

    /// Cached products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Cached product with `id`.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Fetch up to `limit` products and replace the cached list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cached list is left untouched.
    #[instrument(skip(self))]
    pub async fn load(&mut self, limit: u32) -> Result<&[Product], ApiError> {
        let response = self.api.list_products(limit).await?;
        debug!(
            fetched = response.productos.len(),
            total = response.total,
            "Replacing product list"
        );
        self.products = response.productos;
        Ok(&self.products)
    }

    /// [`load`](Self::load) with the configured default limit.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cached list is left untouched.
    pub async fn refresh(&mut self) -> Result<&[Product], ApiError> {
        self.load(self.default_limit).await
    }

    /// Create a product and append it to the cached list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cached list is left untouched.
    #[instrument(skip(self), fields(category = %category_id))]
    pub async fn add(&mut self, category_id: &CategoryId, name: &str) -> Result<Product, ApiError> {
        let product = self.api.create_product(category_id, name).await?;
        info!(id = %product.id, "Product created");
        self.products.push(product.clone());
        Ok(product)
    }

    /// Update a product and replace the cached element with the same id.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cached list is left untouched.
    #[instrument(skip(self), fields(id = %id, category = %category_id))]
    pub async fn update(
        &mut self,
        category_id: &CategoryId,
        name: &str,
        id: &ProductId,
    ) -> Result<Product, ApiError> {
        let updated = self.api.update_product(id, category_id, name).await?;
        for product in self.products.iter_mut().filter(|p| &p.id == id) {
            *product = updated.clone();
        }
        info!("Product updated");
        Ok(updated)
    }

    /// Delete a product and drop it from the cached list.
    ///
    /// The element removed is the one matching the id echoed by the server,
    /// not the requested one.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cached list is left untouched.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&mut self, id: &ProductId) -> Result<(), ApiError> {
        let deleted = self.api.delete_product(id).await?;
        if &deleted.id != id {
            warn!(echoed = %deleted.id, "Server echoed a different product id");
        }
        self.products.retain(|p| p.id != deleted.id);
        info!("Product deleted");
        Ok(())
    }

    /// Fetch one product. The cached list is not touched.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn load_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.api.get_product(id).await
    }

    /// Upload an image for a product.
    ///
    /// Outcome is logged only; neither the caller nor the cached list sees it.
    #[instrument(skip(self, asset), fields(id = %id))]
    pub async fn upload_image(&self, asset: &ImageAsset, id: &ProductId) {
        match self.api.upload_product_image(id, asset).await {
            Ok(product) => info!(image = ?product.image_url, "Image uploaded"),
            Err(e) => warn!(error = %e, "Image upload failed"),
        }
    }

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.api.list_categories().await?.categorias)
    }

    /// Save a product form: update when it has an id, create otherwise.
    ///
    /// A draft without a category keeps the product's current category on
    /// update, and is created under the first listed category otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoCategories`] when a new product needs a category
    /// and the server lists none, or the API error.
    #[instrument(skip(self, draft), fields(id = ?draft.id))]
    pub async fn save(&mut self, draft: &ProductDraft) -> Result<Product, ApiError> {
        match draft.id.as_ref().filter(|id| !id.is_empty()) {
            Some(id) => {
                let category_id = match &draft.category_id {
                    Some(category_id) => category_id.clone(),
                    None => self.load_by_id(id).await?.category.id,
                };
                self.update(&category_id, &draft.name, id).await
            }
            None => {
                let category_id = match &draft.category_id {
                    Some(category_id) => category_id.clone(),
                    None => self
                        .categories()
                        .await?
                        .into_iter()
                        .next()
                        .map(|c| c.id)
                        .ok_or(ApiError::NoCategories)?,
                };
                self.add(&category_id, &draft.name).await
            }
        }
    }
}
