//! Product and category commands.
//!
//! Every command first restores the persisted session and refuses to run
//! unless it is authenticated.

use std::path::PathBuf;

use cafe_catalog_client::ImageAsset;
use cafe_catalog_core::{CategoryId, Product, ProductDraft, ProductId};

use super::{App, CliError};

#[allow(clippy::print_stdout)]
fn print_row(product: &Product) {
    let category = product
        .category
        .name
        .as_deref()
        .unwrap_or_else(|| product.category_id().as_str());
    println!("{}\t{}\t{}", product.id, product.name, category);
}

/// List products.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
pub async fn list(app: &mut App, limit: Option<u32>) -> Result<(), CliError> {
    app.require_authenticated().await?;
    let mut cache = app.products();
    let products = match limit {
        Some(limit) => cache.load(limit).await?,
        None => cache.refresh().await?,
    };
    products.iter().for_each(print_row);
    Ok(())
}

/// Show one product as JSON.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn show(app: &mut App, id: &str) -> Result<(), CliError> {
    app.require_authenticated().await?;
    let product = app.products().load_by_id(&ProductId::new(id)).await?;
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

/// Create (`id == None`) or update a product.
///
/// # Errors
///
/// Returns an error if not signed in, no category is available, or the
/// request fails.
pub async fn save(
    app: &mut App,
    id: Option<String>,
    name: String,
    category: Option<String>,
) -> Result<(), CliError> {
    app.require_authenticated().await?;
    let draft = ProductDraft {
        id: id.map(ProductId::new),
        name,
        category_id: category.map(CategoryId::new),
    };
    let product = app.products().save(&draft).await?;
    print_row(&product);
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn delete(app: &mut App, id: &str) -> Result<(), CliError> {
    app.require_authenticated().await?;
    app.products().delete(&ProductId::new(id)).await?;
    println!("Deleted {id}");
    Ok(())
}

/// Upload a product image, then show the product's image URL.
///
/// Upload failures are only logged, so the URL shown is whatever the server
/// has afterwards.
///
/// # Errors
///
/// Returns an error if not signed in or the product cannot be re-fetched.
#[allow(clippy::print_stdout)]
pub async fn upload_image(app: &mut App, id: &str, path: PathBuf) -> Result<(), CliError> {
    app.require_authenticated().await?;
    let id = ProductId::new(id);
    let cache = app.products();

    cache.upload_image(&ImageAsset::from_path(path), &id).await;

    let product = cache.load_by_id(&id).await?;
    println!(
        "{}\t{}",
        product.id,
        product.image_url.as_deref().unwrap_or("(no image)")
    );
    Ok(())
}

/// List categories.
///
/// # Errors
///
/// Returns an error if not signed in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn categories(app: &mut App) -> Result<(), CliError> {
    app.require_authenticated().await?;
    for category in app.products().categories().await? {
        println!("{}\t{}", category.id, category.name);
    }
    Ok(())
}
