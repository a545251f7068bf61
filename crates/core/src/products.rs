//! Products
//!
//! The product facts the engine needs from the catalogue: prices for discount maths and
//! the attribute ids ranges filter on.

use crate::uuids::TypedUuid;

/// Marker for product identifiers.
#[derive(Debug)]
pub struct ProductMarker;

/// Marker for brand identifiers.
#[derive(Debug)]
pub struct BrandMarker;

/// Marker for category identifiers.
#[derive(Debug)]
pub struct CategoryMarker;

/// Marker for product class identifiers.
#[derive(Debug)]
pub struct ProductClassMarker;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductMarker>;

/// Brand UUID
pub type BrandUuid = TypedUuid<BrandMarker>;

/// Category UUID
pub type CategoryUuid = TypedUuid<CategoryMarker>;

/// Product Class UUID
pub type ProductClassUuid = TypedUuid<ProductClassMarker>;

/// Product prices in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductPrices {
    /// Base (list) price.
    pub price: u64,

    /// Reduced price, when the catalogue marks the product down.
    pub discounted_price: Option<u64>,
}

impl ProductPrices {
    /// Prices for a product that is not marked down.
    pub const fn new(price: u64) -> Self {
        Self {
            price,
            discounted_price: None,
        }
    }

    /// Prices for a marked-down product.
    pub const fn discounted(price: u64, discounted_price: u64) -> Self {
        Self {
            price,
            discounted_price: Some(discounted_price),
        }
    }

    /// The price a unit actually sells for: the discounted price if set, else the base price.
    pub fn selling_price(&self) -> u64 {
        self.discounted_price.unwrap_or(self.price)
    }
}

/// Catalogue attributes used for range eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAttributes {
    /// Product id
    pub uuid: ProductUuid,

    /// Brand assignment
    pub brand: Option<BrandUuid>,

    /// Primary category assignment
    pub category: Option<CategoryUuid>,

    /// Secondary category assignment
    pub secondary_category: Option<CategoryUuid>,

    /// Product class assignment
    pub product_class: Option<ProductClassUuid>,
}

impl ProductAttributes {
    /// Attributes for a product with no brand, category or class.
    pub fn bare(uuid: ProductUuid) -> Self {
        Self {
            uuid,
            brand: None,
            category: None,
            secondary_category: None,
            product_class: None,
        }
    }
}

/// Product as supplied by the catalogue lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Display name
    pub name: String,

    /// Prices
    pub prices: ProductPrices,

    /// Range attributes
    pub attributes: ProductAttributes,
}

impl Product {
    /// Product id
    pub fn uuid(&self) -> ProductUuid {
        self.attributes.uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selling_price_prefers_discounted_price() {
        assert_eq!(ProductPrices::new(100).selling_price(), 100);
        assert_eq!(ProductPrices::discounted(100, 80).selling_price(), 80);
    }
}
