//! Fixtures
//!
//! YAML scenarios (catalogue, offers, carts and usage counts) loaded into a
//! [`MemoryStore`]. Records are named by string keys in the YAML; the loader assigns each
//! key a fresh id and remembers the mapping so the CLI can refer to carts and users by key.

use std::{path::Path, sync::Arc};

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rebate::{
    benefits::{Benefit, BenefitKind},
    conditions::{Condition, ConditionKind},
    content::{CartLineUuid, SessionUuid, UserUuid},
    merge::CartLine,
    offers::{Audience, Offer, OfferKind, OfferRule, OfferUuid, UsageLimits, ValidityWindow},
    products::{
        BrandUuid, CategoryUuid, Product, ProductAttributes, ProductClassUuid, ProductMarker,
        ProductPrices, ProductUuid,
    },
    ranges::{Dimension, FilterMode, Range},
    uuids::TypedUuid,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::carts::{
        models::NewCart,
        repository::{AppliedVouchersRepository, CartsRepository},
    },
    memory::MemoryStore,
    store::StoreError,
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between the scenario and a price
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Offer not found, by key or voucher code
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// Cart not found
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid offer data
    #[error("Invalid offer data: {0}")]
    InvalidOffer(String),

    /// The store rejected a record
    #[error("Failed to store fixture record: {0}")]
    Store(#[from] StoreError),
}

/// Scenario file
#[derive(Debug, Deserialize)]
pub struct ScenarioFixture {
    /// ISO currency code every price is given in
    pub currency: String,

    /// Product key -> product
    #[serde(default)]
    pub products: FxHashMap<String, ProductFixture>,

    /// Offer key -> offer
    #[serde(default)]
    pub offers: FxHashMap<String, OfferFixture>,

    /// Cart key -> cart
    #[serde(default)]
    pub carts: FxHashMap<String, CartFixture>,

    /// Prior redemptions per (offer, user)
    #[serde(default)]
    pub usages: Vec<UsageFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Product price (e.g., "2.99 GBP")
    pub price: String,

    /// Marked-down price
    #[serde(default)]
    pub discounted_price: Option<String>,

    /// Brand key
    #[serde(default)]
    pub brand: Option<String>,

    /// Primary category key
    #[serde(default)]
    pub category: Option<String>,

    /// Secondary category key
    #[serde(default)]
    pub secondary_category: Option<String>,

    /// Product class key
    #[serde(default)]
    pub product_class: Option<String>,
}

/// Offer type
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKindFixture {
    Site,
    Voucher,
    User,
}

impl From<OfferKindFixture> for OfferKind {
    fn from(kind: OfferKindFixture) -> Self {
        match kind {
            OfferKindFixture::Site => Self::Site,
            OfferKindFixture::Voucher => Self::Voucher,
            OfferKindFixture::User => Self::User,
        }
    }
}

/// Offer Fixture
#[derive(Debug, Deserialize)]
pub struct OfferFixture {
    /// Display name
    pub name: String,

    /// Offer type
    pub kind: OfferKindFixture,

    /// Redemption code, required for vouchers
    #[serde(default)]
    pub code: Option<String>,

    /// Higher priorities apply first
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "active")]
    pub active: bool,

    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// User keys; everyone when omitted
    #[serde(default)]
    pub audience: Option<Vec<String>>,

    #[serde(default)]
    pub limits: LimitsFixture,

    /// Redemptions so far, across all users
    #[serde(default)]
    pub usage_count: u64,

    #[serde(default)]
    pub created_at: Option<Timestamp>,

    pub range: RangeFixture,

    pub condition: ConditionFixture,

    pub benefit: BenefitFixture,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitsFixture {
    #[serde(default)]
    pub per_user: Option<u64>,

    #[serde(default)]
    pub overall: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterModeFixture {
    Inclusive,
    #[default]
    Union,
}

/// Range Fixture
#[derive(Debug, Deserialize)]
pub struct RangeFixture {
    #[serde(default)]
    pub mode: FilterModeFixture,

    #[serde(default = "active")]
    pub active: bool,

    #[serde(default)]
    pub products: DimensionFixture,

    #[serde(default)]
    pub brands: DimensionFixture,

    #[serde(default)]
    pub categories: DimensionFixture,

    #[serde(default)]
    pub product_classes: DimensionFixture,
}

/// Include/exclude keys for one range dimension
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DimensionFixture {
    pub all: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    BasketQuantity,
    BasketTotal,
    DistinctItems,
}

/// Condition Fixture
#[derive(Debug, Deserialize)]
pub struct ConditionFixture {
    #[serde(rename = "type")]
    pub kind: ConditionType,

    /// Quantity threshold, for quantity and distinct-item conditions
    #[serde(default)]
    pub threshold: Option<u32>,

    /// Value threshold (e.g., "50.00 GBP"), for basket total conditions
    #[serde(default)]
    pub total: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitType {
    FixedAmount,
    Percentage,
    FreeShipping,
    FixedPrice,
}

/// Benefit Fixture
#[derive(Debug, Deserialize)]
pub struct BenefitFixture {
    #[serde(rename = "type")]
    pub kind: BenefitType,

    /// Amount off each unit (e.g., "1.00 GBP"), for fixed amount benefits
    #[serde(default)]
    pub amount: Option<String>,

    /// Percentage off (e.g., "15%" or "0.15")
    #[serde(default)]
    pub percentage: Option<String>,

    /// Unit price, for fixed price benefits
    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub max_affected_items: Option<u32>,

    #[serde(default = "active")]
    pub active: bool,
}

/// Cart Fixture
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Owning user key
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub lines: Vec<LineFixture>,

    /// Voucher codes already attached to the cart
    #[serde(default)]
    pub vouchers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineFixture {
    pub product: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UsageFixture {
    pub offer: String,
    pub user: String,
    pub count: u64,
}

const fn active() -> bool {
    true
}

/// A scenario loaded into an in-memory store.
#[derive(Debug)]
pub struct Fixture {
    store: Arc<MemoryStore>,
    currency: &'static Currency,
    sessions: FxHashMap<String, SessionUuid>,
    users: FxHashMap<String, UserUuid>,
}

impl Fixture {
    /// Load a scenario from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or references unknown records.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = tokio::fs::read_to_string(path).await?;

        Self::from_yaml(&contents).await
    }

    /// Load a scenario from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or references unknown records.
    pub async fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let scenario: ScenarioFixture = serde_norway::from_str(yaml)?;
        let currency = parse_currency(&scenario.currency)?;

        Loader::new(currency).load(scenario).await
    }

    /// Store holding the scenario's records.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Scenario currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Session of the cart with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::CartNotFound`] for unknown keys.
    pub fn session(&self, key: &str) -> Result<SessionUuid, FixtureError> {
        self.sessions
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::CartNotFound(key.to_string()))
    }

    /// User with the given key. A UUID is accepted for users the scenario does not name.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UserNotFound`] if the key is neither known nor a UUID.
    pub fn user(&self, key: &str) -> Result<UserUuid, FixtureError> {
        if let Some(user) = self.users.get(key) {
            return Ok(*user);
        }

        Uuid::parse_str(key)
            .map(UserUuid::from_uuid)
            .map_err(|_err| FixtureError::UserNotFound(key.to_string()))
    }
}

/// Key -> id mappings built while loading.
#[derive(Debug, Default)]
struct Keys {
    products: FxHashMap<String, ProductUuid>,
    brands: FxHashMap<String, BrandUuid>,
    categories: FxHashMap<String, CategoryUuid>,
    product_classes: FxHashMap<String, ProductClassUuid>,
    offers: FxHashMap<String, OfferUuid>,
    voucher_codes: FxHashMap<String, OfferUuid>,
    users: FxHashMap<String, UserUuid>,
    sessions: FxHashMap<String, SessionUuid>,
}

fn intern<M>(keys: &mut FxHashMap<String, TypedUuid<M>>, key: &str) -> TypedUuid<M> {
    *keys.entry(key.to_string()).or_default()
}

struct Loader {
    store: Arc<MemoryStore>,
    currency: &'static Currency,
    keys: Keys,
}

impl Loader {
    fn new(currency: &'static Currency) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            currency,
            keys: Keys::default(),
        }
    }

    async fn load(mut self, scenario: ScenarioFixture) -> Result<Fixture, FixtureError> {
        let product_count = scenario.products.len();
        let offer_count = scenario.offers.len();
        let cart_count = scenario.carts.len();

        for (key, fixture) in scenario.products {
            let product = self.product(&key, fixture)?;

            self.store.insert_product(product).await;
        }

        for (key, fixture) in scenario.offers {
            let rule = self.offer(&key, fixture)?;

            self.store.insert_offer(rule).await;
        }

        for (key, fixture) in scenario.carts {
            self.cart(key, fixture).await?;
        }

        for usage in scenario.usages {
            let offer = self
                .keys
                .offers
                .get(&usage.offer)
                .copied()
                .ok_or_else(|| FixtureError::OfferNotFound(usage.offer.clone()))?;

            let user = intern(&mut self.keys.users, &usage.user);

            self.store.set_user_usage(offer, user, usage.count).await;
        }

        info!(product_count, offer_count, cart_count, "loaded fixture");

        Ok(Fixture {
            store: self.store,
            currency: self.currency,
            sessions: self.keys.sessions,
            users: self.keys.users,
        })
    }

    fn minor_units(&self, price: &str) -> Result<u64, FixtureError> {
        let (minor_units, currency) = parse_price(price)?;

        if currency != self.currency {
            return Err(FixtureError::CurrencyMismatch(
                self.currency.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ));
        }

        Ok(minor_units)
    }

    fn product(&mut self, key: &str, fixture: ProductFixture) -> Result<Product, FixtureError> {
        let price = self.minor_units(&fixture.price)?;

        let prices = match fixture.discounted_price {
            Some(discounted) => ProductPrices::discounted(price, self.minor_units(&discounted)?),
            None => ProductPrices::new(price),
        };

        let keys = &mut self.keys;

        Ok(Product {
            name: fixture.name,
            prices,
            attributes: ProductAttributes {
                uuid: intern(&mut keys.products, key),
                brand: fixture.brand.map(|brand| intern(&mut keys.brands, &brand)),
                category: fixture
                    .category
                    .map(|category| intern(&mut keys.categories, &category)),
                secondary_category: fixture
                    .secondary_category
                    .map(|category| intern(&mut keys.categories, &category)),
                product_class: fixture
                    .product_class
                    .map(|class| intern(&mut keys.product_classes, &class)),
            },
        })
    }

    fn offer(&mut self, key: &str, fixture: OfferFixture) -> Result<OfferRule, FixtureError> {
        let kind = OfferKind::from(fixture.kind);

        if kind == OfferKind::Voucher && fixture.code.is_none() {
            return Err(FixtureError::InvalidOffer(format!("voucher {key} has no code")));
        }

        let audience = match fixture.audience {
            Some(users) => Audience::Users(
                users
                    .iter()
                    .map(|user| intern(&mut self.keys.users, user))
                    .collect(),
            ),
            None => Audience::Everyone,
        };

        let offer = Offer {
            uuid: intern(&mut self.keys.offers, key),
            name: fixture.name,
            kind,
            voucher_code: fixture.code,
            audience,
            window: ValidityWindow {
                starts_at: fixture.starts_at,
                ends_at: fixture.ends_at,
            },
            is_active: fixture.active,
            priority: fixture.priority,
            limits: UsageLimits {
                per_user: fixture.limits.per_user,
                overall: fixture.limits.overall,
            },
            usage_count: fixture.usage_count,
            created_at: fixture.created_at.unwrap_or_else(Timestamp::now),
        };

        if let Some(code) = &offer.voucher_code {
            self.keys.voucher_codes.insert(code.clone(), offer.uuid);
        }

        Ok(OfferRule {
            range: self.range(fixture.range)?,
            condition: self.condition(key, &fixture.condition)?,
            benefit: self.benefit(key, &fixture.benefit)?,
            offer,
        })
    }

    fn range(&mut self, fixture: RangeFixture) -> Result<Range, FixtureError> {
        let mode = match fixture.mode {
            FilterModeFixture::Inclusive => FilterMode::Inclusive,
            FilterModeFixture::Union => FilterMode::Union,
        };

        let mut range = Range::new(mode)
            .with_products(self.product_dimension(&fixture.products)?)
            .with_brands(interned(&mut self.keys.brands, &fixture.brands))
            .with_categories(interned(&mut self.keys.categories, &fixture.categories))
            .with_product_classes(interned(
                &mut self.keys.product_classes,
                &fixture.product_classes,
            ));

        range.is_active = fixture.active;

        Ok(range)
    }

    /// Product keys must name products loaded earlier.
    fn product_dimension(
        &self,
        fixture: &DimensionFixture,
    ) -> Result<Dimension<ProductMarker>, FixtureError> {
        let lookup = |key: &String| {
            self.keys
                .products
                .get(key)
                .copied()
                .ok_or_else(|| FixtureError::ProductNotFound(key.clone()))
        };

        Ok(Dimension {
            include_all: fixture.all,
            included: fixture.include.iter().map(lookup).collect::<Result<_, _>>()?,
            excluded: fixture.exclude.iter().map(lookup).collect::<Result<_, _>>()?,
        })
    }

    fn condition(&self, key: &str, fixture: &ConditionFixture) -> Result<Condition, FixtureError> {
        let threshold = || {
            fixture
                .threshold
                .ok_or_else(|| FixtureError::InvalidOffer(format!("{key}: condition needs a threshold")))
        };

        let kind = match fixture.kind {
            ConditionType::BasketQuantity => ConditionKind::BasketQuantity(threshold()?),
            ConditionType::DistinctItems => ConditionKind::DistinctItems(threshold()?),
            ConditionType::BasketTotal => {
                let total = fixture.total.as_deref().ok_or_else(|| {
                    FixtureError::InvalidOffer(format!("{key}: condition needs a total"))
                })?;

                ConditionKind::BasketTotal(self.minor_units(total)?)
            }
        };

        Ok(Condition::new(kind))
    }

    fn benefit(&self, key: &str, fixture: &BenefitFixture) -> Result<Benefit, FixtureError> {
        let missing = |field: &str| FixtureError::InvalidOffer(format!("{key}: benefit needs {field}"));

        let kind = match fixture.kind {
            BenefitType::FixedAmount => {
                let amount = fixture.amount.as_deref().ok_or_else(|| missing("an amount"))?;

                BenefitKind::FixedAmount(self.minor_units(amount)?)
            }
            BenefitType::Percentage => {
                let percentage = fixture
                    .percentage
                    .as_deref()
                    .ok_or_else(|| missing("a percentage"))?;

                BenefitKind::Percentage(parse_percentage(percentage)?)
            }
            BenefitType::FixedPrice => {
                let price = fixture.price.as_deref().ok_or_else(|| missing("a price"))?;

                BenefitKind::FixedPrice(self.minor_units(price)?)
            }
            BenefitType::FreeShipping => BenefitKind::FreeShipping,
        };

        let mut benefit = Benefit::new(kind);

        benefit.max_affected_items = fixture.max_affected_items;
        benefit.is_active = fixture.active;

        Ok(benefit)
    }

    async fn cart(&mut self, key: String, fixture: CartFixture) -> Result<(), FixtureError> {
        let user = fixture
            .user
            .as_deref()
            .map(|user| intern(&mut self.keys.users, user));

        let session = intern(&mut self.keys.sessions, &key);
        let cart = self
            .store
            .create_cart(NewCart::for_session(session, user))
            .await?;

        for line in fixture.lines {
            let product = self
                .keys
                .products
                .get(&line.product)
                .copied()
                .ok_or_else(|| FixtureError::ProductNotFound(line.product.clone()))?;

            self.store
                .insert_line(
                    cart.uuid,
                    CartLine {
                        uuid: CartLineUuid::new(),
                        product,
                        quantity: line.quantity,
                    },
                )
                .await?;
        }

        for code in fixture.vouchers {
            let offer = self
                .keys
                .voucher_codes
                .get(&code)
                .copied()
                .ok_or(FixtureError::OfferNotFound(code))?;

            self.store.insert_applied(cart.uuid, offer).await?;
        }

        Ok(())
    }
}

fn interned<M>(keys: &mut FxHashMap<String, TypedUuid<M>>, fixture: &DimensionFixture) -> Dimension<M> {
    Dimension {
        include_all: fixture.all,
        included: fixture.include.iter().map(|key| intern(keys, key)).collect(),
        excluded: fixture.exclude.iter().map(|key| intern(keys, key)).collect(),
    }
}

/// Parse an ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for codes other than GBP, USD and EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount
/// is not a non-negative decimal, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(u64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(currency_code)?;

    let minor_units = amount
        .checked_mul(Decimal::from(10_u64.pow(currency.exponent)))
        .and_then(|value| value.round_dp(0).to_u64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}
