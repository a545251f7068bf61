//! Cart Content
//!
//! The fully priced, in-memory view of a cart. It is built fresh for every read, then
//! mutated in place as offers are applied, and is owned by exactly one pricing pass.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    benefits::BenefitKind,
    offers::OfferUuid,
    products::{Product, ProductAttributes, ProductPrices, ProductUuid},
    uuids::TypedUuid,
};

/// Marker for cart identifiers.
#[derive(Debug)]
pub struct CartMarker;

/// Marker for cart line identifiers.
#[derive(Debug)]
pub struct CartLineMarker;

/// Marker for anonymous session identifiers.
#[derive(Debug)]
pub struct SessionMarker;

/// Marker for user identifiers.
#[derive(Debug)]
pub struct UserMarker;

/// Cart UUID
pub type CartUuid = TypedUuid<CartMarker>;

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLineMarker>;

/// Session UUID
pub type SessionUuid = TypedUuid<SessionMarker>;

/// User UUID
pub type UserUuid = TypedUuid<UserMarker>;

/// Errors raised when presenting cart amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    /// An amount does not fit the money representation.
    #[error("amount {0} is too large to represent")]
    AmountOverflow(u64),
}

/// Cart lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartStatus {
    /// Being shopped.
    #[default]
    Open,

    /// Locked for checkout.
    Frozen,

    /// Abandoned or cancelled.
    Cancelled,

    /// Folded into another cart; terminal.
    Merged,
}

impl CartStatus {
    /// Status name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Frozen => "frozen",
            Self::Cancelled => "cancelled",
            Self::Merged => "merged",
        }
    }
}

/// Cart header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartHeader {
    /// Cart id
    pub uuid: CartUuid,

    /// Session the cart was started in
    pub session: SessionUuid,

    /// Owning user, once known
    pub user: Option<UserUuid>,

    /// Lifecycle status
    pub status: CartStatus,
}

/// Which discount ledger an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountLedger {
    /// Offers applied automatically to the cart's user.
    Standing,

    /// Offers redeemed with a voucher code.
    Voucher,
}

/// One recorded discount.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountEntry {
    /// Offer that granted the discount
    pub offer: OfferUuid,

    /// Offer name
    pub name: String,

    /// Benefit that produced the amount
    pub benefit: BenefitKind,

    /// Discount in minor units
    pub amount: u64,

    /// Redeemed code, for voucher discounts
    pub voucher_code: Option<String>,
}

/// A priced cart line with its discount ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentLine {
    uuid: CartLineUuid,
    name: String,
    product: ProductAttributes,
    prices: ProductPrices,
    quantity: u32,
    total_offer_discount: u64,
    standing_discounts: Vec<DiscountEntry>,
    voucher_discounts: Vec<DiscountEntry>,
}

impl ContentLine {
    /// Create an undiscounted line for a product.
    pub fn new(uuid: CartLineUuid, product: Product, quantity: u32) -> Self {
        Self {
            uuid,
            name: product.name,
            product: product.attributes,
            prices: product.prices,
            quantity,
            total_offer_discount: 0,
            standing_discounts: Vec::new(),
            voucher_discounts: Vec::new(),
        }
    }

    /// Line id
    pub fn uuid(&self) -> CartLineUuid {
        self.uuid
    }

    /// Product name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Product id
    pub fn product_uuid(&self) -> ProductUuid {
        self.product.uuid
    }

    /// Product range attributes
    pub fn product(&self) -> &ProductAttributes {
        &self.product
    }

    /// Product prices
    pub fn prices(&self) -> ProductPrices {
        self.prices
    }

    /// Unit count
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price one unit sells for.
    pub fn unit_selling_price(&self) -> u64 {
        self.prices.selling_price()
    }

    /// `quantity × unit selling price`
    pub fn value(&self) -> u64 {
        u64::from(self.quantity).saturating_mul(self.unit_selling_price())
    }

    /// Sum of every discount recorded on this line.
    pub fn total_offer_discount(&self) -> u64 {
        self.total_offer_discount
    }

    /// Value still available to discount.
    pub fn remaining_value(&self) -> u64 {
        self.value().saturating_sub(self.total_offer_discount)
    }

    /// No value is left to discount.
    pub fn is_fully_discounted(&self) -> bool {
        self.remaining_value() == 0
    }

    /// Standing offer discounts, in application order.
    pub fn standing_discounts(&self) -> &[DiscountEntry] {
        &self.standing_discounts
    }

    /// Voucher discounts, in application order.
    pub fn voucher_discounts(&self) -> &[DiscountEntry] {
        &self.voucher_discounts
    }

    fn ledger_mut(&mut self, ledger: DiscountLedger) -> &mut Vec<DiscountEntry> {
        match ledger {
            DiscountLedger::Standing => &mut self.standing_discounts,
            DiscountLedger::Voucher => &mut self.voucher_discounts,
        }
    }
}

/// Cart content aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct CartContent {
    header: CartHeader,
    currency: &'static Currency,
    lines: Vec<ContentLine>,
    standing_discounts: Vec<DiscountEntry>,
    voucher_discounts: Vec<DiscountEntry>,
    total_offer_discount: u64,
}

impl CartContent {
    /// Create undiscounted content from priced lines.
    pub fn new(
        header: CartHeader,
        lines: impl Into<Vec<ContentLine>>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            header,
            currency,
            lines: lines.into(),
            standing_discounts: Vec::new(),
            voucher_discounts: Vec::new(),
            total_offer_discount: 0,
        }
    }

    /// Cart header
    pub fn header(&self) -> &CartHeader {
        &self.header
    }

    /// Cart id
    pub fn cart_uuid(&self) -> CartUuid {
        self.header.uuid
    }

    /// Owning user, if any
    pub fn user(&self) -> Option<UserUuid> {
        self.header.user
    }

    /// Cart currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Lines in cart order
    pub fn lines(&self) -> &[ContentLine] {
        &self.lines
    }

    /// A single line
    pub fn line(&self, idx: usize) -> Option<&ContentLine> {
        self.lines.get(idx)
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Standing offer discounts across every line, in application order.
    pub fn standing_discounts(&self) -> &[DiscountEntry] {
        &self.standing_discounts
    }

    /// Voucher discounts across every line, in application order.
    pub fn voucher_discounts(&self) -> &[DiscountEntry] {
        &self.voucher_discounts
    }

    /// Sum of every discount recorded on the cart.
    pub fn total_offer_discount(&self) -> u64 {
        self.total_offer_discount
    }

    /// Undiscounted value of every line.
    pub fn subtotal(&self) -> u64 {
        self.lines
            .iter()
            .fold(0, |acc: u64, line| acc.saturating_add(line.value()))
    }

    /// Value payable after offer discounts.
    pub fn total(&self) -> u64 {
        self.subtotal().saturating_sub(self.total_offer_discount)
    }

    /// Record a discount on a line and mirror it at cart level.
    ///
    /// Returns `false`, recording nothing, when `idx` is not a line of this cart.
    pub fn record_discount(
        &mut self,
        idx: usize,
        ledger: DiscountLedger,
        entry: DiscountEntry,
    ) -> bool {
        let Some(line) = self.lines.get_mut(idx) else {
            return false;
        };

        let amount = entry.amount;

        line.total_offer_discount = line.total_offer_discount.saturating_add(amount);
        line.ledger_mut(ledger).push(entry.clone());

        self.total_offer_discount = self.total_offer_discount.saturating_add(amount);

        match ledger {
            DiscountLedger::Standing => self.standing_discounts.push(entry),
            DiscountLedger::Voucher => self.voucher_discounts.push(entry),
        }

        true
    }

    /// Present a minor-unit amount in the cart currency.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::AmountOverflow`] if the amount exceeds `i64::MAX`.
    pub fn money(&self, minor: u64) -> Result<Money<'static, Currency>, ContentError> {
        let minor_i64 = i64::try_from(minor).map_err(|_err| ContentError::AmountOverflow(minor))?;

        Ok(Money::from_minor(minor_i64, self.currency))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn header() -> CartHeader {
        CartHeader {
            uuid: CartUuid::new(),
            session: SessionUuid::new(),
            user: None,
            status: CartStatus::Open,
        }
    }

    fn product(name: &str, prices: ProductPrices) -> Product {
        Product {
            name: name.to_string(),
            prices,
            attributes: ProductAttributes::bare(ProductUuid::new()),
        }
    }

    fn entry(amount: u64) -> DiscountEntry {
        DiscountEntry {
            offer: OfferUuid::new(),
            name: "Test offer".to_string(),
            benefit: BenefitKind::FixedAmount(amount),
            amount,
            voucher_code: None,
        }
    }

    #[test]
    fn line_value_uses_selling_price() {
        let line = ContentLine::new(
            CartLineUuid::new(),
            product("Socks", ProductPrices::discounted(500, 400)),
            3,
        );

        assert_eq!(line.value(), 1_200);
        assert_eq!(line.remaining_value(), 1_200);
        assert!(!line.is_fully_discounted());
    }

    #[test]
    fn record_discount_mirrors_line_totals_at_cart_level() -> TestResult {
        let lines = [
            ContentLine::new(CartLineUuid::new(), product("Hat", ProductPrices::new(1_000)), 1),
            ContentLine::new(CartLineUuid::new(), product("Scarf", ProductPrices::new(2_000)), 2),
        ];

        let mut content = CartContent::new(header(), lines, GBP);

        assert!(content.record_discount(0, DiscountLedger::Standing, entry(100)));
        assert!(content.record_discount(1, DiscountLedger::Voucher, entry(250)));

        let line_sum: u64 = content.lines().iter().map(ContentLine::total_offer_discount).sum();

        assert_eq!(content.total_offer_discount(), 350);
        assert_eq!(line_sum, content.total_offer_discount());
        assert_eq!(content.standing_discounts().len(), 1);
        assert_eq!(content.voucher_discounts().len(), 1);
        assert_eq!(content.subtotal(), 5_000);
        assert_eq!(content.total(), 4_650);
        assert_eq!(content.money(content.total())?, Money::from_minor(4_650, GBP));

        Ok(())
    }

    #[test]
    fn record_discount_out_of_range_records_nothing() {
        let mut content = CartContent::new(header(), Vec::new(), GBP);

        assert!(!content.record_discount(0, DiscountLedger::Standing, entry(100)));
        assert_eq!(content.total_offer_discount(), 0);
        assert!(content.standing_discounts().is_empty());
    }

    #[test]
    fn money_rejects_amounts_beyond_i64() {
        let content = CartContent::new(header(), Vec::new(), GBP);

        assert_eq!(
            content.money(u64::MAX),
            Err(ContentError::AmountOverflow(u64::MAX))
        );
    }
}
