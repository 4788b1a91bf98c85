#![deny(warnings)]

//! Core domain models for the HPP calculator.
//!
//! This crate defines the serializable cost-item shapes exchanged with the
//! form layer and with external suggestion services, the result records the
//! calculators produce, locale-aware number handling, and unit conversion.
//! Field names on the wire are camelCase and must stay stable.

pub mod numfmt;
pub mod units;

use numfmt::amount;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use numfmt::{
    format_currency_display, format_localized_decimal, format_localized_integer,
    parse_localized_number,
};
pub use units::{cost_per_use, to_base_unit, units_compatible, Unit, UnitClass};

/// Purchase lot and per-product usage of one ingredient.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsageBasis {
    /// Amount used for one product, in `usage_unit`.
    pub usage_amount: Decimal,
    pub usage_unit: String,
    /// Price paid for the whole lot.
    pub purchase_price: Decimal,
    /// Size of the lot, in `purchase_unit`.
    pub purchase_quantity: Decimal,
    pub purchase_unit: String,
}

impl UsageBasis {
    /// Cost of one product's usage; zero when units do not line up.
    pub fn cost_per_use(&self) -> Decimal {
        units::cost_per_use(
            self.usage_amount,
            &self.usage_unit,
            self.purchase_price,
            self.purchase_quantity,
            &self.purchase_unit,
        )
    }
}

/// How a variable cost line states its per-unit cost.
#[derive(Clone, Debug, PartialEq)]
pub enum CostBasis {
    /// Cost per product entered directly.
    Direct { cost: Decimal },
    /// Cost derived from a purchase lot and a usage amount.
    Derived(UsageBasis),
}

/// One ingredient or consumable in a product's variable cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "VariableCostRecord", into = "VariableCostRecord")]
pub struct VariableCostItem {
    pub name: String,
    pub basis: CostBasis,
}

impl VariableCostItem {
    pub fn direct(name: impl Into<String>, cost: Decimal) -> Self {
        Self {
            name: name.into(),
            basis: CostBasis::Direct { cost },
        }
    }

    pub fn derived(name: impl Into<String>, usage: UsageBasis) -> Self {
        Self {
            name: name.into(),
            basis: CostBasis::Derived(usage),
        }
    }
}

/// Flat wire shape shared by both variable-cost variants.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableCostRecord {
    #[serde(default)]
    name: String,
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    cost: Option<Decimal>,
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    usage_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage_unit: Option<String>,
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    purchase_price: Option<Decimal>,
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    purchase_quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purchase_unit: Option<String>,
}

impl VariableCostRecord {
    /// Purchase price or quantity marks a derived row; a unit alone does not.
    fn carries_purchase_fields(&self) -> bool {
        self.purchase_price.is_some() || self.purchase_quantity.is_some()
    }
}

impl From<VariableCostRecord> for VariableCostItem {
    fn from(r: VariableCostRecord) -> Self {
        if r.carries_purchase_fields() {
            let usage = UsageBasis {
                usage_amount: r.usage_amount.unwrap_or(Decimal::ZERO),
                usage_unit: r.usage_unit.unwrap_or_default(),
                purchase_price: r.purchase_price.unwrap_or(Decimal::ZERO),
                purchase_quantity: r.purchase_quantity.unwrap_or(Decimal::ZERO),
                purchase_unit: r.purchase_unit.unwrap_or_default(),
            };
            VariableCostItem::derived(r.name, usage)
        } else {
            VariableCostItem::direct(r.name, r.cost.unwrap_or(Decimal::ZERO))
        }
    }
}

impl From<VariableCostItem> for VariableCostRecord {
    fn from(item: VariableCostItem) -> Self {
        match item.basis {
            CostBasis::Direct { cost } => VariableCostRecord {
                name: item.name,
                cost: Some(cost),
                ..Default::default()
            },
            CostBasis::Derived(u) => VariableCostRecord {
                name: item.name,
                cost: None,
                usage_amount: Some(u.usage_amount),
                usage_unit: Some(u.usage_unit),
                purchase_price: Some(u.purchase_price),
                purchase_quantity: Some(u.purchase_quantity),
                purchase_unit: Some(u.purchase_unit),
            },
        }
    }
}

/// A monthly overhead line (rent, salaries, utilities).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostItem {
    #[serde(default)]
    pub name: String,
    /// Cost per month.
    #[serde(default, with = "amount::or_zero")]
    pub total_cost: Decimal,
    /// Manual per-unit allocation. When set it replaces the amount derived
    /// from the monthly sales target for this line only.
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    pub allocation_per_unit: Option<Decimal>,
}

impl FixedCostItem {
    pub fn monthly(name: impl Into<String>, total_cost: Decimal) -> Self {
        Self {
            name: name.into(),
            total_cost,
            allocation_per_unit: None,
        }
    }

    pub fn with_allocation(mut self, per_unit: Decimal) -> Self {
        self.allocation_per_unit = Some(per_unit);
        self
    }
}

/// Everything entered for one product in a single evaluation pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingContext {
    #[serde(default)]
    pub variable_costs: Vec<VariableCostItem>,
    #[serde(default)]
    pub fixed_costs: Vec<FixedCostItem>,
    #[serde(default, with = "amount::or_zero")]
    pub target_sales_per_month: Decimal,
}

/// Unit production cost and its components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HppBreakdown {
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub variable_cost_per_unit: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub fixed_cost_per_unit: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub total_fixed_cost_per_month: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub hpp: Decimal,
}

/// Pricing strategy tiers, cheapest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTierKind {
    Competitive,
    Standard,
    Premium,
}

impl PriceTierKind {
    pub const ALL: [PriceTierKind; 3] = [
        PriceTierKind::Competitive,
        PriceTierKind::Standard,
        PriceTierKind::Premium,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriceTierKind::Competitive => "competitive",
            PriceTierKind::Standard => "standard",
            PriceTierKind::Premium => "premium",
        }
    }
}

impl fmt::Display for PriceTierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier name that is not one of the three strategies.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown price tier: {0:?}")]
pub struct TierError(pub String);

impl FromStr for PriceTierKind {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "competitive" => Ok(PriceTierKind::Competitive),
            "standard" => Ok(PriceTierKind::Standard),
            "premium" => Ok(PriceTierKind::Premium),
            _ => Err(TierError(s.trim().to_string())),
        }
    }
}

/// Where a tier's values came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierSource {
    #[default]
    Computed,
    External,
}

/// One recommended selling price.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub kind: PriceTierKind,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub price: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub margin_percent: Decimal,
    pub explanation: String,
    pub source: TierSource,
}

/// The three recommended prices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceTiers {
    pub competitive: PriceTier,
    pub standard: PriceTier,
    pub premium: PriceTier,
}

impl PriceTiers {
    pub fn get(&self, kind: PriceTierKind) -> &PriceTier {
        match kind {
            PriceTierKind::Competitive => &self.competitive,
            PriceTierKind::Standard => &self.standard,
            PriceTierKind::Premium => &self.premium,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceTier> {
        [&self.competitive, &self.standard, &self.premium].into_iter()
    }
}

/// Externally suggested values for one tier. Only numeric coercion is
/// applied; anything missing falls back to the computed tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TierOverride {
    #[serde(default, with = "amount", skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(
        default,
        alias = "marginPercent",
        with = "amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub margin: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Externally suggested price tiers, same shape as [`PriceTiers`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive: Option<TierOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<TierOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<TierOverride>,
}

impl PriceOverrides {
    pub fn get(&self, kind: PriceTierKind) -> Option<&TierOverride> {
        match kind {
            PriceTierKind::Competitive => self.competitive.as_ref(),
            PriceTierKind::Standard => self.standard.as_ref(),
            PriceTierKind::Premium => self.premium.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.competitive.is_none() && self.standard.is_none() && self.premium.is_none()
    }
}

/// Selling price choice: one of the recommended tiers or an explicit amount.
/// On the wire a tier is its name and an amount is a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceChoice {
    Tier(PriceTierKind),
    Amount(Decimal),
}

impl Default for PriceChoice {
    fn default() -> Self {
        PriceChoice::Tier(PriceTierKind::Standard)
    }
}

impl PriceChoice {
    /// Tier names win; anything else is read as a localized amount.
    pub fn parse_lenient(s: &str) -> Self {
        match s.parse::<PriceTierKind>() {
            Ok(kind) => PriceChoice::Tier(kind),
            Err(_) => PriceChoice::Amount(parse_localized_number(s)),
        }
    }
}

impl FromStr for PriceChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl Serialize for PriceChoice {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            PriceChoice::Tier(kind) => s.serialize_str(kind.as_str()),
            PriceChoice::Amount(value) => amount::or_zero::serialize(value, s),
        }
    }
}

impl<'de> Deserialize<'de> for PriceChoice {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct ChoiceVisitor;

        impl<'de> Visitor<'de> for ChoiceVisitor {
            type Value = PriceChoice;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a price tier name or an amount")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PriceChoice::parse_lenient(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(PriceChoice::Amount(Decimal::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(PriceChoice::Amount(Decimal::from(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                use rust_decimal::prelude::FromPrimitive;
                Ok(PriceChoice::Amount(
                    Decimal::from_f64(v).unwrap_or(Decimal::ZERO),
                ))
            }
        }

        d.deserialize_any(ChoiceVisitor)
    }
}

/// Break-even point for a selling price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BepResult {
    /// First whole unit count at or above break-even.
    pub bep_unit: u64,
    /// Revenue at `bep_unit`.
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub bep_rupiah: Decimal,
    /// False when the price does not exceed the variable cost per unit.
    pub is_valid: bool,
}

impl BepResult {
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// One sampled point of the sales simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRow {
    pub units: u64,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub revenue: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub variable_cost: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub fixed_cost: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub total_cost: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub profit: Decimal,
}

/// Calculator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalcConfig {
    /// Upper bound of the simulation table (default: 1500 units).
    pub max_units: u64,
    /// Days used to turn a monthly volume into a daily pace (default: 30).
    pub days_per_month: u32,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            max_units: 1500,
            days_per_month: 30,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("maxUnits must be > 0")]
    ZeroMaxUnits,
    #[error("daysPerMonth must be within [1, 31], got {0}")]
    DaysPerMonthOutOfRange(u32),
}

impl CalcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_units == 0 {
            return Err(ConfigError::ZeroMaxUnits);
        }
        if !(1..=31).contains(&self.days_per_month) {
            return Err(ConfigError::DaysPerMonthOutOfRange(self.days_per_month));
        }
        Ok(())
    }
}
