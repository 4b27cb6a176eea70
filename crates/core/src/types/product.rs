//! Products and categories.
//!
//! The catalog API embeds related documents inconsistently: a product's
//! `categoria` is a populated `{_id, nombre}` object on reads but may come
//! back as a bare id string from writes. [`CategoryRef`] accepts both.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CategoryId, ProductId, UserId};

/// A product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Product name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Category the product belongs to.
    #[serde(rename = "categoria")]
    pub category: CategoryRef,
    /// Uploaded image URL, if any.
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unit price.
    #[serde(rename = "precio", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Whether the product is currently offered.
    #[serde(rename = "disponible", default = "default_true")]
    pub available: bool,
    /// Free-form description.
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User that created the product.
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserRef>,
}

impl Product {
    /// Id of the product's category.
    #[must_use]
    pub const fn category_id(&self) -> &CategoryId {
        &self.category.id
    }
}

const fn default_true() -> bool {
    true
}

/// Reference from a product to its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CategoryRefRepr")]
pub struct CategoryRef {
    /// Category id.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// Category name when the server populated it.
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CategoryRef {
    /// A reference carrying only the id.
    #[must_use]
    pub fn id_only(id: CategoryId) -> Self {
        Self { id, name: None }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryRefRepr {
    Id(CategoryId),
    Populated {
        #[serde(rename = "_id")]
        id: CategoryId,
        #[serde(rename = "nombre", default)]
        name: Option<String>,
    },
}

impl From<CategoryRefRepr> for CategoryRef {
    fn from(repr: CategoryRefRepr) -> Self {
        match repr {
            CategoryRefRepr::Id(id) => Self::id_only(id),
            CategoryRefRepr::Populated { id, name } => Self { id, name },
        }
    }
}

/// Reference to the user that owns a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User id.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// User name when populated.
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Server-assigned id.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// Category name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// User that created the category.
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserRef>,
}

/// Product form contents before saving.
///
/// A draft without an id is created on save; a draft with an id updates
/// the existing product. A draft without a category is saved under the
/// first category the server lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// Id of the product being edited, `None` for a new product.
    pub id: Option<ProductId>,
    /// Product name.
    pub name: String,
    /// Chosen category.
    pub category_id: Option<CategoryId>,
}

impl ProductDraft {
    /// Draft for a new product.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category_id: None,
        }
    }

    /// Draft editing an existing product, prefilled from the record.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            name: product.name.clone(),
            category_id: Some(product.category.id.clone()),
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}
