//! Offer Ranges
//!
//! A range describes which products an offer covers, using include and exclude sets over
//! four catalogue dimensions: products, brands, categories and product classes.

use rustc_hash::FxHashSet;

use crate::{
    products::{
        BrandMarker, CategoryMarker, ProductAttributes, ProductClassMarker, ProductMarker,
        ProductUuid,
    },
    uuids::TypedUuid,
};

/// Marker for range identifiers.
#[derive(Debug)]
pub struct RangeMarker;

/// Range UUID
pub type RangeUuid = TypedUuid<RangeMarker>;

/// How the per-dimension tests are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// A product must pass every dimension ("all of X, Y and Z").
    Inclusive,

    /// A product must pass at least one dimension ("any of X or Y").
    #[default]
    Union,
}

/// Include/exclude sets for one catalogue dimension.
#[derive(Debug)]
pub struct Dimension<M> {
    /// Every value of this dimension is included (exclusions still apply).
    pub include_all: bool,

    /// Explicitly included values.
    pub included: FxHashSet<TypedUuid<M>>,

    /// Explicitly excluded values.
    pub excluded: FxHashSet<TypedUuid<M>>,
}

impl<M> Dimension<M> {
    /// A dimension that includes nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            include_all: false,
            included: FxHashSet::default(),
            excluded: FxHashSet::default(),
        }
    }

    /// A dimension that includes every value.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_all: true,
            ..Self::none()
        }
    }

    /// A dimension including exactly the given values.
    #[must_use]
    pub fn including(values: impl IntoIterator<Item = TypedUuid<M>>) -> Self {
        Self {
            included: values.into_iter().collect(),
            ..Self::none()
        }
    }

    /// Add exclusions to this dimension.
    #[must_use]
    pub fn excluding(mut self, values: impl IntoIterator<Item = TypedUuid<M>>) -> Self {
        self.excluded.extend(values);
        self
    }

    /// Whether a product with the given assignments passes this dimension.
    ///
    /// A product passes when any assigned value is included (or `include_all` is set) and
    /// none of its assigned values are excluded.
    fn accepts<'v>(&self, values: impl IntoIterator<Item = &'v TypedUuid<M>> + Clone) -> bool
    where
        M: 'v,
    {
        let included = self.include_all
            || values
                .clone()
                .into_iter()
                .any(|value| self.included.contains(value));

        included && !values.into_iter().any(|value| self.excluded.contains(value))
    }
}

impl<M> Default for Dimension<M> {
    fn default() -> Self {
        Self::none()
    }
}

impl<M> Clone for Dimension<M> {
    fn clone(&self) -> Self {
        Self {
            include_all: self.include_all,
            included: self.included.clone(),
            excluded: self.excluded.clone(),
        }
    }
}

impl<M> PartialEq for Dimension<M> {
    fn eq(&self, other: &Self) -> bool {
        self.include_all == other.include_all
            && self.included == other.included
            && self.excluded == other.excluded
    }
}

/// Offer range
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Range id
    pub uuid: RangeUuid,

    /// Combination mode
    pub mode: FilterMode,

    /// Inactive ranges cover nothing.
    pub is_active: bool,

    /// Product dimension
    pub products: Dimension<ProductMarker>,

    /// Brand dimension
    pub brands: Dimension<BrandMarker>,

    /// Category dimension, matched against primary and secondary categories.
    pub categories: Dimension<CategoryMarker>,

    /// Product class dimension
    pub product_classes: Dimension<ProductClassMarker>,
}

impl Range {
    /// An active range in the given mode with every dimension empty.
    #[must_use]
    pub fn new(mode: FilterMode) -> Self {
        Self {
            uuid: RangeUuid::new(),
            mode,
            is_active: true,
            products: Dimension::none(),
            brands: Dimension::none(),
            categories: Dimension::none(),
            product_classes: Dimension::none(),
        }
    }

    /// Replace the product dimension.
    #[must_use]
    pub fn with_products(mut self, products: Dimension<ProductMarker>) -> Self {
        self.products = products;
        self
    }

    /// Replace the brand dimension.
    #[must_use]
    pub fn with_brands(mut self, brands: Dimension<BrandMarker>) -> Self {
        self.brands = brands;
        self
    }

    /// Replace the category dimension.
    #[must_use]
    pub fn with_categories(mut self, categories: Dimension<CategoryMarker>) -> Self {
        self.categories = categories;
        self
    }

    /// Replace the product class dimension.
    #[must_use]
    pub fn with_product_classes(mut self, product_classes: Dimension<ProductClassMarker>) -> Self {
        self.product_classes = product_classes;
        self
    }

    /// Whether this range covers the given product.
    pub fn covers(&self, product: &ProductAttributes) -> bool {
        if !self.is_active {
            return false;
        }

        let categories = [product.category, product.secondary_category];

        let mut tests = [
            self.products.accepts([&product.uuid]),
            self.brands.accepts(product.brand.as_ref()),
            self.categories.accepts(categories.iter().flatten()),
            self.product_classes.accepts(product.product_class.as_ref()),
        ]
        .into_iter();

        match self.mode {
            FilterMode::Inclusive => tests.all(|passed| passed),
            FilterMode::Union => tests.any(|passed| passed),
        }
    }

    /// The subset of candidate products this range covers.
    pub fn covered_products<'p>(
        &self,
        candidates: impl IntoIterator<Item = &'p ProductAttributes>,
    ) -> FxHashSet<ProductUuid> {
        candidates
            .into_iter()
            .filter(|product| self.covers(product))
            .map(|product| product.uuid)
            .collect()
    }
}
