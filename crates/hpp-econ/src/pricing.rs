//! Margin-tier price recommendations.
//!
//! Prices are HPP times a fixed markup per tier, rounded to whole rupiah.
//! An externally supplied recommendation may replace any field of any tier.

use hpp_core::numfmt::round_whole;
use hpp_core::{PriceOverrides, PriceTier, PriceTierKind, PriceTiers, TierSource};
use rust_decimal::Decimal;
use tracing::debug;

/// Markup multiplier and declared margin percent for a tier.
fn markup(kind: PriceTierKind) -> (Decimal, Decimal) {
    match kind {
        PriceTierKind::Competitive => (Decimal::new(130, 2), Decimal::from(30)),
        PriceTierKind::Standard => (Decimal::new(155, 2), Decimal::from(55)),
        PriceTierKind::Premium => (Decimal::new(180, 2), Decimal::from(80)),
    }
}

fn default_explanation(kind: PriceTierKind) -> &'static str {
    match kind {
        PriceTierKind::Competitive => {
            "Suited to highly competitive markets; relies on high sales volume."
        }
        PriceTierKind::Standard => {
            "Balances profitability and competitiveness; the most common choice."
        }
        PriceTierKind::Premium => {
            "For premium positioning built on quality and exclusivity."
        }
    }
}

fn computed_tier(kind: PriceTierKind, hpp: Decimal) -> PriceTier {
    let (price, margin_percent) = if hpp > Decimal::ZERO {
        let (multiplier, margin) = markup(kind);
        (round_whole(hpp.saturating_mul(multiplier)), margin)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    PriceTier {
        kind,
        price,
        margin_percent,
        explanation: default_explanation(kind).to_string(),
        source: TierSource::Computed,
    }
}

/// Computed tiers for a unit cost; all prices and margins are zero when
/// `hpp <= 0`.
///
/// Example:
/// let tiers = recommend_prices(Decimal::from(10_000));
/// assert_eq!(tiers.standard.price, Decimal::from(15_500));
pub fn recommend_prices(hpp: Decimal) -> PriceTiers {
    PriceTiers {
        competitive: computed_tier(PriceTierKind::Competitive, hpp),
        standard: computed_tier(PriceTierKind::Standard, hpp),
        premium: computed_tier(PriceTierKind::Premium, hpp),
    }
}

fn present(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

fn merge_tier(mut tier: PriceTier, overrides: &PriceOverrides) -> PriceTier {
    let Some(o) = overrides.get(tier.kind) else {
        return tier;
    };
    if let Some(price) = present(o.price) {
        tier.price = price;
    }
    if let Some(margin) = present(o.margin) {
        tier.margin_percent = margin;
    }
    if let Some(text) = o.explanation.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        tier.explanation = text.to_string();
    }
    tier.source = TierSource::External;
    debug!(tier = %tier.kind, price = %tier.price, "external price tier applied");
    tier
}

/// Replace computed fields with external ones where those are present.
/// Zero and empty external values count as absent.
pub fn apply_overrides(defaults: PriceTiers, overrides: &PriceOverrides) -> PriceTiers {
    PriceTiers {
        competitive: merge_tier(defaults.competitive, overrides),
        standard: merge_tier(defaults.standard, overrides),
        premium: merge_tier(defaults.premium, overrides),
    }
}

/// Computed tiers with optional external overrides merged in.
pub fn price_recommendations(hpp: Decimal, overrides: Option<&PriceOverrides>) -> PriceTiers {
    let tiers = recommend_prices(hpp);
    match overrides {
        Some(o) if !o.is_empty() => apply_overrides(tiers, o),
        _ => tiers,
    }
}

/// Profit on each unit sold at `selling_price`.
pub fn profit_per_unit(hpp: Decimal, selling_price: Decimal) -> Decimal {
    selling_price.saturating_sub(hpp)
}
