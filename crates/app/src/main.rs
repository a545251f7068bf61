//! Rebate Application CLI

use std::{io, process};

use jiff::Timestamp;
use rebate::{
    content::CartContent,
    merge::MergePolicy,
    offers::OfferUuid,
    receipt::{ReceiptError, write_receipt},
};
use rebate_app::{
    config::{AppConfig, Command, MergeArgs, PriceArgs},
    context::AppContext,
    domain::{
        carts::CartsServiceError, offers::OffersServiceError, pricing::PricingServiceError,
    },
    fixtures::{Fixture, FixtureError},
    observability,
    store::Store,
};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingServiceError),

    #[error("cart operation failed: {0}")]
    Carts(#[from] CartsServiceError),

    #[error("usage update failed: {0}")]
    Offers(#[from] OffersServiceError),

    #[error("failed to write receipt: {0}")]
    Receipt(#[from] ReceiptError),
}

#[tokio::main]
pub async fn main() {
    let config = AppConfig::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_subscriber(&config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = run(config).await {
        error!(%error, "command failed");
        process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), CliError> {
    let policy = config.merge.policy();

    let content = match config.command {
        Command::Price(args) => price(args, policy).await?,
        Command::Merge(args) => merge(args, policy).await?,
    };

    write_receipt(io::stdout().lock(), &content)?;

    Ok(())
}

async fn price(args: PriceArgs, policy: MergePolicy) -> Result<CartContent, CliError> {
    let fixture = Fixture::from_path(&args.fixture).await?;
    let ctx = AppContext::new(Store::memory(fixture.store()), fixture.currency(), policy);
    let session = fixture.session(&args.session)?;
    let now = args.at.unwrap_or_else(Timestamp::now);

    let mut content = ctx.pricing.build_cart_content(session, now).await?;

    for code in &args.vouchers {
        content = ctx.pricing.apply_voucher_code(session, code, now).await?;
    }

    if args.confirm {
        confirm(&ctx, &content).await?;
    }

    Ok(content)
}

async fn merge(args: MergeArgs, policy: MergePolicy) -> Result<CartContent, CliError> {
    let fixture = Fixture::from_path(&args.fixture).await?;
    let ctx = AppContext::new(Store::memory(fixture.store()), fixture.currency(), policy);
    let session = fixture.session(&args.session)?;
    let user = fixture.user(&args.user)?;
    let now = args.at.unwrap_or_else(Timestamp::now);

    Ok(ctx.carts.merge_carts(user, session, now).await?)
}

/// Count every offer on the priced cart as redeemed once by the cart's user.
async fn confirm(ctx: &AppContext, content: &CartContent) -> Result<(), CliError> {
    let Some(user) = content.user() else {
        warn!("anonymous carts do not count towards offer usage");
        return Ok(());
    };

    let mut offers: SmallVec<[OfferUuid; 8]> = SmallVec::new();

    for entry in content
        .standing_discounts()
        .iter()
        .chain(content.voucher_discounts())
    {
        if !offers.contains(&entry.offer) {
            offers.push(entry.offer);
        }
    }

    ctx.offers.increment_usage(&offers, user).await?;

    info!(offer_count = offers.len(), "confirmed offer usage");

    Ok(())
}
