//! Purchase and usage units for ingredient costing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Physical dimension a unit measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Weight,
    Volume,
    Count,
}

/// Units understood by the converter. Base units are gram, millilitre and
/// the count units themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Pcs,
    Buah,
    Lembar,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("empty unit")]
    Empty,
    #[error("unknown unit: {0}")]
    Unknown(String),
}

impl Unit {
    pub fn class(self) -> UnitClass {
        match self {
            Unit::Gram | Unit::Kilogram => UnitClass::Weight,
            Unit::Milliliter | Unit::Liter => UnitClass::Volume,
            Unit::Pcs | Unit::Buah | Unit::Lembar => UnitClass::Count,
        }
    }

    /// Multiplier from this unit to its class base unit.
    pub fn base_factor(self) -> Decimal {
        match self {
            Unit::Kilogram | Unit::Liter => Decimal::from(1000),
            _ => Decimal::ONE,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Milliliter => "ml",
            Unit::Liter => "L",
            Unit::Pcs => "pcs",
            Unit::Buah => "buah",
            Unit::Lembar => "lembar",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "" => Err(UnitError::Empty),
            "g" => Ok(Unit::Gram),
            "kg" => Ok(Unit::Kilogram),
            "ml" => Ok(Unit::Milliliter),
            "l" => Ok(Unit::Liter),
            "pcs" => Ok(Unit::Pcs),
            "buah" => Ok(Unit::Buah),
            "lembar" => Ok(Unit::Lembar),
            _ => Err(UnitError::Unknown(s.trim().to_string())),
        }
    }
}

/// Convert `value` expressed in `unit` to its base unit. Unknown units pass
/// the value through unchanged.
pub fn to_base_unit(value: Decimal, unit: &str) -> Decimal {
    match unit.parse::<Unit>() {
        Ok(u) => value.saturating_mul(u.base_factor()),
        Err(_) => value,
    }
}

/// Whether two unit labels measure the same thing. Identical labels always
/// match, even for units the converter does not know.
pub fn units_compatible(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    match (a.parse::<Unit>(), b.parse::<Unit>()) {
        (Ok(x), Ok(y)) => x.class() == y.class(),
        _ => false,
    }
}

/// Cost of using `usage_amount` of an ingredient bought as a lot of
/// `purchase_quantity` for `purchase_price`.
///
/// Returns zero when any amount is not positive, a unit is missing, or the
/// units are incompatible. Zero here is indistinguishable from a free
/// ingredient.
///
/// Example:
/// // 250 g out of a 1 kg bag costing 50.000
/// let c = cost_per_use(Decimal::from(250), "g", Decimal::from(50_000), Decimal::ONE, "kg");
/// assert_eq!(c, Decimal::from(12_500));
pub fn cost_per_use(
    usage_amount: Decimal,
    usage_unit: &str,
    purchase_price: Decimal,
    purchase_quantity: Decimal,
    purchase_unit: &str,
) -> Decimal {
    if usage_amount <= Decimal::ZERO
        || purchase_price <= Decimal::ZERO
        || purchase_quantity <= Decimal::ZERO
    {
        return Decimal::ZERO;
    }
    if !units_compatible(usage_unit, purchase_unit) {
        debug!(usage_unit, purchase_unit, "incompatible units, cost treated as zero");
        return Decimal::ZERO;
    }
    let base_quantity = to_base_unit(purchase_quantity, purchase_unit);
    let Some(per_base_unit) = purchase_price.checked_div(base_quantity) else {
        return Decimal::ZERO;
    };
    per_base_unit.saturating_mul(to_base_unit(usage_amount, usage_unit))
}
