//! Turning free-text model responses into cost items and price overrides.
//!
//! Responses are expected to hold JSON, possibly wrapped in Markdown fences
//! or surrounded by prose. Values only get numeric coercion; anything that
//! cannot be used is dropped rather than rejected, as long as something
//! usable remains.

use crate::AdvisorError;
use hpp_core::numfmt::{parse_localized_number, round_whole};
use hpp_core::{FixedCostItem, PriceOverrides, PriceTierKind, TierOverride, VariableCostItem};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Cost lists suggested in one combined response. A list is `None` when the
/// response had nothing usable for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSuggestion {
    pub variable_costs: Option<Vec<VariableCostItem>>,
    pub fixed_costs: Option<Vec<FixedCostItem>>,
}

/// Remove Markdown code fences (```` ```json ```` and ```` ``` ````).
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        let mut after = &rest[pos + 3..];
        if after
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
        {
            after = &after[4..];
        }
        after = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\n'))
            .unwrap_or(after);
        rest = after;
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// First `[` up to the first `]` after it.
fn extract_array(text: &str) -> Result<&str, AdvisorError> {
    if let Some(start) = text.find('[') {
        if let Some(len) = text[start..].find(']') {
            return Ok(&text[start..=start + len]);
        }
    }
    debug!(len = text.len(), "no JSON array delimiters in response");
    Err(AdvisorError::NoJsonFound)
}

/// First `{` up to the last `}`.
fn extract_object(text: &str) -> Result<&str, AdvisorError> {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return Ok(&text[start..=end]);
        }
    }
    debug!(len = text.len(), "no JSON object delimiters in response");
    Err(AdvisorError::NoJsonFound)
}

fn parse_json(text: &str) -> Result<Value, AdvisorError> {
    serde_json::from_str(text).map_err(|e| AdvisorError::InvalidJson(e.to_string()))
}

fn coerce_amount(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or(Decimal::ZERO),
        Some(Value::String(s)) => parse_localized_number(s),
        _ => Decimal::ZERO,
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Name and absolute amount of a list entry, if both are usable.
fn named_amount(entry: &Value, amount_key: &str) -> Option<(String, Decimal)> {
    if !entry.is_object() {
        return None;
    }
    let name = coerce_text(entry.get("name"));
    let amount = coerce_amount(entry.get(amount_key)).abs();
    if name.is_empty() || amount.is_zero() {
        return None;
    }
    Some((name, amount))
}

fn variable_items(entries: &[Value]) -> Vec<VariableCostItem> {
    entries
        .iter()
        .filter_map(|e| named_amount(e, "cost"))
        .map(|(name, cost)| VariableCostItem::direct(name, cost))
        .collect()
}

fn fixed_items(entries: &[Value]) -> Vec<FixedCostItem> {
    entries
        .iter()
        .filter_map(|e| named_amount(e, "totalCost"))
        .map(|(name, total)| FixedCostItem::monthly(name, total))
        .collect()
}

fn expect_array(value: Value) -> Result<Vec<Value>, AdvisorError> {
    match value {
        Value::Array(entries) if !entries.is_empty() => Ok(entries),
        Value::Array(_) => Err(AdvisorError::NoValidItems),
        _ => Err(AdvisorError::InvalidJson("expected a JSON array".into())),
    }
}

/// Parse a `[{"name", "cost"}]` response into direct variable cost items.
pub fn parse_variable_costs(text: &str) -> Result<Vec<VariableCostItem>, AdvisorError> {
    let cleaned = strip_code_fences(text);
    let entries = expect_array(parse_json(extract_array(&cleaned)?)?)?;
    let items = variable_items(&entries);
    if items.is_empty() {
        return Err(AdvisorError::NoValidItems);
    }
    Ok(items)
}

/// Parse a `[{"name", "totalCost"}]` response into monthly fixed cost items.
pub fn parse_fixed_costs(text: &str) -> Result<Vec<FixedCostItem>, AdvisorError> {
    let cleaned = strip_code_fences(text);
    let entries = expect_array(parse_json(extract_array(&cleaned)?)?)?;
    let items = fixed_items(&entries);
    if items.is_empty() {
        return Err(AdvisorError::NoValidItems);
    }
    Ok(items)
}

fn list_field<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Parse a `{"variableCosts": [..], "fixedCosts": [..]}` response. Either
/// list may be missing, but not both.
pub fn parse_all_costs(text: &str) -> Result<CostSuggestion, AdvisorError> {
    let cleaned = strip_code_fences(text);
    let value = parse_json(extract_object(&cleaned)?)?;
    let variable = variable_items(list_field(&value, "variableCosts"));
    let fixed = fixed_items(list_field(&value, "fixedCosts"));
    if variable.is_empty() && fixed.is_empty() {
        return Err(AdvisorError::NoValidItems);
    }
    Ok(CostSuggestion {
        variable_costs: (!variable.is_empty()).then_some(variable),
        fixed_costs: (!fixed.is_empty()).then_some(fixed),
    })
}

fn tier_override(entry: &Value) -> Option<TierOverride> {
    if !entry.is_object() {
        return None;
    }
    let price = round_whole(coerce_amount(entry.get("price")));
    let margin = round_whole(coerce_amount(entry.get("margin").or(entry.get("marginPercent"))));
    let explanation = coerce_text(entry.get("explanation"));
    Some(TierOverride {
        price: Some(price),
        margin: Some(margin),
        explanation: (!explanation.is_empty()).then_some(explanation),
    })
}

/// Parse a three-tier price response. At least one tier must carry a
/// non-zero price.
pub fn parse_price_overrides(text: &str) -> Result<PriceOverrides, AdvisorError> {
    let cleaned = strip_code_fences(text);
    let value = parse_json(extract_object(&cleaned)?)?;
    if !value.is_object() {
        return Err(AdvisorError::InvalidJson("expected a JSON object".into()));
    }
    let tier = |kind: PriceTierKind| value.get(kind.as_str()).and_then(tier_override);
    let overrides = PriceOverrides {
        competitive: tier(PriceTierKind::Competitive),
        standard: tier(PriceTierKind::Standard),
        premium: tier(PriceTierKind::Premium),
    };
    let any_price = PriceTierKind::ALL.iter().any(|k| {
        overrides
            .get(*k)
            .and_then(|o| o.price)
            .is_some_and(|p| !p.is_zero())
    });
    if !any_price {
        return Err(AdvisorError::NoValidItems);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpp_core::CostBasis;
    use proptest::prelude::*;

    #[test]
    fn strips_fences() {
        let text = "```json\n[{\"name\": \"Kopi\", \"cost\": 2250}]\n```";
        assert_eq!(strip_code_fences(text), "[{\"name\": \"Kopi\", \"cost\": 2250}]");
        assert_eq!(strip_code_fences("```JSON\r\n{}\r\n```"), "{}");
        assert_eq!(strip_code_fences("plain"), "plain");
    }

    #[test]
    fn variable_costs_from_fenced_prose() {
        let text = "Berikut daftarnya:\n```json\n[\n  {\"name\": \" Kopi bubuk \", \"cost\": 2250},\n  {\"name\": \"Susu cair\", \"cost\": \"2.400\"},\n  {\"name\": \"\", \"cost\": 100},\n  {\"name\": \"Es batu\", \"cost\": 0},\n  {\"name\": \"Diskon\", \"cost\": -300},\n  \"bukan objek\"\n]\n```\nSemoga membantu.";
        let items = parse_variable_costs(text).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Kopi bubuk");
        assert_eq!(
            items[1].basis,
            CostBasis::Direct {
                cost: Decimal::from(2400)
            }
        );
        assert_eq!(
            items[2].basis,
            CostBasis::Direct {
                cost: Decimal::from(300)
            }
        );
    }

    #[test]
    fn variable_costs_errors() {
        assert_eq!(
            parse_variable_costs("no json here"),
            Err(AdvisorError::NoJsonFound)
        );
        assert!(matches!(
            parse_variable_costs("[{name: Kopi}]"),
            Err(AdvisorError::InvalidJson(_))
        ));
        assert_eq!(parse_variable_costs("[]"), Err(AdvisorError::NoValidItems));
        assert_eq!(
            parse_variable_costs("[{\"name\": \"\", \"cost\": 0}]"),
            Err(AdvisorError::NoValidItems)
        );
    }

    #[test]
    fn fixed_costs_list() {
        let items = parse_fixed_costs(
            "[{\"name\": \"Sewa tempat\", \"totalCost\": 2000000}, {\"name\": \"Gaji\"}]",
        )
        .unwrap();
        assert_eq!(items, vec![FixedCostItem::monthly("Sewa tempat", Decimal::from(2_000_000))]);
    }

    #[test]
    fn combined_costs_allow_one_missing_list() {
        let s = parse_all_costs(
            "Hasil: {\"variableCosts\": [{\"name\": \"Cup\", \"cost\": 700}], \"fixedCosts\": []}",
        )
        .unwrap();
        assert_eq!(s.variable_costs.as_ref().map(Vec::len), Some(1));
        assert_eq!(s.fixed_costs, None);

        assert_eq!(
            parse_all_costs("{\"variableCosts\": [], \"fixedCosts\": null}"),
            Err(AdvisorError::NoValidItems)
        );
    }

    #[test]
    fn price_overrides_are_rounded() {
        let o = parse_price_overrides(
            "```json\n{\"competitive\": {\"price\": 13250.6, \"margin\": 29.5, \"explanation\": \" Murah \"},\n \"standard\": {\"price\": \"16.000\", \"margin\": 60},\n \"premium\": \"n/a\"}\n```",
        )
        .unwrap();
        let c = o.competitive.unwrap();
        assert_eq!(c.price, Some(Decimal::from(13_251)));
        assert_eq!(c.margin, Some(Decimal::from(30)));
        assert_eq!(c.explanation.as_deref(), Some("Murah"));
        let s = o.standard.unwrap();
        assert_eq!(s.price, Some(Decimal::from(16_000)));
        assert_eq!(s.explanation, None);
        assert_eq!(o.premium, None);
    }

    #[test]
    fn price_overrides_need_a_price() {
        assert_eq!(
            parse_price_overrides("{\"standard\": {\"price\": 0, \"margin\": 50}}"),
            Err(AdvisorError::NoValidItems)
        );
        assert!(matches!(
            parse_price_overrides("{not json}"),
            Err(AdvisorError::InvalidJson(_))
        ));
        assert_eq!(
            parse_price_overrides("} standard {"),
            Err(AdvisorError::NoJsonFound)
        );
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_panics(text in ".{0,200}") {
            let _ = parse_variable_costs(&text);
            let _ = parse_all_costs(&text);
            let _ = parse_price_overrides(&text);
        }

        #[test]
        fn accepted_items_are_named_and_positive(costs in proptest::collection::vec(-1_000_000i64..1_000_000, 1..10)) {
            let body: Vec<String> = costs
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{{\"name\": \"item {i}\", \"cost\": {c}}}"))
                .collect();
            let text = format!("```json\n[{}]\n```", body.join(","));
            match parse_variable_costs(&text) {
                Ok(items) => {
                    prop_assert_eq!(items.len(), costs.iter().filter(|c| **c != 0).count());
                    for item in items {
                        prop_assert!(!item.name.is_empty());
                        match item.basis {
                            CostBasis::Direct { cost } => prop_assert!(cost > Decimal::ZERO),
                            CostBasis::Derived(_) => prop_assert!(false, "suggested items are direct"),
                        }
                    }
                }
                Err(err) => {
                    prop_assert_eq!(err, AdvisorError::NoValidItems);
                    prop_assert!(costs.iter().all(|c| *c == 0));
                }
            }
        }
    }
}
