//! Receipt
//!
//! Renders cart content as a table: one row per line, one row per discount recorded on it,
//! then the cart totals.

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::content::{CartContent, ContentError, ContentLine, DiscountEntry};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An amount could not be presented as money.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Write `content` as a receipt table followed by its totals.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if an amount cannot be presented or the output fails.
pub fn write_receipt(mut out: impl io::Write, content: &CartContent) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();
    let mut line_rows: Vec<usize> = Vec::with_capacity(content.len());

    builder.push_record(["", "Item", "Qty", "Unit Price", "Value", "Discount", "Offer"]);

    let mut row = 1;

    for (idx, line) in content.lines().iter().enumerate() {
        line_rows.push(row);

        builder.push_record([
            format!("#{:<3}", idx + 1),
            line.name().to_string(),
            line.quantity().to_string(),
            content.money(line.unit_selling_price())?.to_string(),
            content.money(line.value())?.to_string(),
            String::new(),
            String::new(),
        ]);

        row += 1;

        for entry in ledger_entries(line) {
            builder.push_record([
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                format!("-{}", content.money(entry.amount)?),
                offer_label(entry),
            ]);

            row += 1;
        }
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();

    for &line_row in &line_rows {
        theme.insert_horizontal_line(line_row, separator);
    }

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

    let subtotal = content.money(content.subtotal())?;
    let discount = content.money(content.total_offer_discount())?;
    let total = content.money(content.total())?;

    writeln!(out, " Subtotal: {subtotal}").map_err(|_err| ReceiptError::IO)?;
    writeln!(out, " Discount: -{discount}").map_err(|_err| ReceiptError::IO)?;
    writeln!(out, " Total:    {total}").map_err(|_err| ReceiptError::IO)?;

    Ok(())
}

fn ledger_entries(line: &ContentLine) -> impl Iterator<Item = &DiscountEntry> {
    line.standing_discounts()
        .iter()
        .chain(line.voucher_discounts())
}

fn offer_label(entry: &DiscountEntry) -> String {
    match &entry.voucher_code {
        Some(code) => format!("{} ({code})", entry.name),
        None => entry.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        application::apply_voucher,
        benefits::{Benefit, BenefitKind},
        conditions::{Condition, ConditionKind},
        content::{CartHeader, CartLineUuid, CartStatus, CartUuid, SessionUuid},
        offers::{Offer, OfferRule},
        products::{Product, ProductAttributes, ProductPrices, ProductUuid},
        ranges::{Dimension, FilterMode, Range},
    };

    use super::*;

    #[test]
    fn receipt_lists_lines_discounts_and_totals() -> TestResult {
        let product = ProductUuid::new();

        let mut content = CartContent::new(
            CartHeader {
                uuid: CartUuid::new(),
                session: SessionUuid::new(),
                user: None,
                status: CartStatus::Open,
            },
            [ContentLine::new(
                CartLineUuid::new(),
                Product {
                    name: "Teapot".to_string(),
                    prices: ProductPrices::new(2_000),
                    attributes: ProductAttributes::bare(product),
                },
                2,
            )],
            GBP,
        );

        let voucher = OfferRule {
            offer: Offer::voucher("Teapot treat", "TEA5", Timestamp::now()),
            range: Range::new(FilterMode::Union).with_products(Dimension::including([product])),
            condition: Condition::new(ConditionKind::BasketQuantity(1)),
            benefit: Benefit::new(BenefitKind::FixedAmount(500)),
        };

        apply_voucher(&mut content, &voucher)?;

        let mut out = Vec::new();

        write_receipt(&mut out, &content)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Teapot"));
        assert!(rendered.contains("Teapot treat (TEA5)"));
        assert!(rendered.contains("£40.00"));
        assert!(rendered.contains("-£10.00"));
        assert!(rendered.contains("£30.00"));

        Ok(())
    }
}
