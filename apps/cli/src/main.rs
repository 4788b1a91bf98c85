#![deny(warnings)]

//! Headless CLI: evaluate one product costing scenario and print the report.

use anyhow::{bail, Context, Result};
use hpp_ai::{Advisor, AdvisorConfig, ProductInfo, ReplayClient};
use hpp_core::numfmt::amount;
use hpp_core::{
    format_currency_display, format_localized_decimal, CalcConfig, CostingContext,
    FixedCostItem, PriceChoice, PriceOverrides, TierSource, VariableCostItem,
};
use hpp_econ::simulation::sample_step;
use hpp_econ::{evaluate, hpp_for_context, profit_per_unit, CostingReport, Evaluation};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt::{self, Write as _};
use std::path::Path;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<String>,
    price: Option<String>,
    target_profit: Option<String>,
    suggestions: Option<String>,
    json: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => out.scenario = it.next(),
            "--price" => out.price = it.next(),
            "--target-profit" => out.target_profit = it.next(),
            "--suggestions" => out.suggestions = it.next(),
            "--json" => out.json = true,
            "--version" | "-V" => out.version = true,
            _ => {}
        }
    }
    out
}

/// One product's inputs as stored on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    #[serde(default)]
    product: ProductInfo,
    #[serde(default, with = "amount::or_zero")]
    target_sales_per_month: Decimal,
    #[serde(default)]
    variable_costs: Vec<VariableCostItem>,
    #[serde(default)]
    fixed_costs: Vec<FixedCostItem>,
    #[serde(default)]
    selling_price: PriceChoice,
    #[serde(default, with = "amount")]
    target_profit: Option<Decimal>,
    #[serde(default, with = "amount")]
    daily_sales: Option<Decimal>,
    #[serde(default)]
    config: CalcConfig,
}

impl Scenario {
    fn context(&self) -> CostingContext {
        CostingContext {
            variable_costs: self.variable_costs.clone(),
            fixed_costs: self.fixed_costs.clone(),
            target_sales_per_month: self.target_sales_per_month,
        }
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing scenario {}", path.display()))?;
    scenario
        .config
        .validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(scenario)
}

const USAGE: &str = "usage: hpp --scenario PATH [--price TIER|AMOUNT] [--target-profit AMOUNT] [--suggestions PATH] [--json]

Amounts in id-ID form (\"1.000\", \"2.500,5\") must be quoted in the scenario
YAML; an unquoted 1.000 is the number one.

--suggestions takes a captured response file, or a directory holding
price-tiers/<model>.txt or price-tiers.txt, tried in HPP_AI_MODELS order.";

/// Count fields holding a fraction, usually an unquoted id-ID amount.
fn fractional_counts(scenario: &Scenario) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if !scenario.target_sales_per_month.fract().is_zero() {
        fields.push("targetSalesPerMonth");
    }
    if scenario.daily_sales.is_some_and(|d| !d.fract().is_zero()) {
        fields.push("dailySales");
    }
    fields
}

/// Price tiers from captured suggestion responses, tried per model.
fn suggest_prices(
    path: &Path,
    config: AdvisorConfig,
    product: &ProductInfo,
    context: &CostingContext,
) -> Result<PriceOverrides> {
    let advisor = Advisor::new(config, ReplayClient::new(path));
    advisor
        .price_tiers(product, hpp_for_context(context), context.target_sales_per_month)
        .with_context(|| format!("price suggestions from {}", path.display()))
}

fn source_label(source: TierSource) -> &'static str {
    match source {
        TierSource::Computed => "computed",
        TierSource::External => "suggested",
    }
}

fn count(units: u64) -> String {
    format_localized_decimal(Decimal::from(units), 0)
}

fn render_text(
    product: &ProductInfo,
    report: &CostingReport,
    config: &CalcConfig,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let title = if product.name.is_empty() {
        "Product"
    } else {
        product.name.as_str()
    };
    if product.category.is_empty() {
        writeln!(out, "{title}")?;
    } else {
        writeln!(out, "{title} ({})", product.category)?;
    }

    let hpp = &report.hpp;
    writeln!(out, "\nProduction cost")?;
    writeln!(
        out,
        "  variable / unit     {}",
        format_currency_display(hpp.variable_cost_per_unit)
    )?;
    writeln!(
        out,
        "  fixed / unit        {}",
        format_currency_display(hpp.fixed_cost_per_unit)
    )?;
    writeln!(
        out,
        "  fixed / month       {}",
        format_currency_display(hpp.total_fixed_cost_per_month)
    )?;
    writeln!(out, "  HPP                 {}", format_currency_display(hpp.hpp))?;

    writeln!(out, "\nPrice tiers")?;
    for tier in report.prices.iter() {
        writeln!(
            out,
            "  {:<12} {:>14}  margin {:>3}%  profit/unit {:>12}  [{}]",
            tier.kind.as_str(),
            format_currency_display(tier.price),
            format_localized_decimal(tier.margin_percent, 0),
            format_currency_display(profit_per_unit(hpp.hpp, tier.price)),
            source_label(tier.source),
        )?;
        if !tier.explanation.is_empty() {
            writeln!(out, "               {}", tier.explanation)?;
        }
    }

    if report.selected_price <= Decimal::ZERO {
        writeln!(out, "\nNo selling price selected.")?;
        return Ok(out);
    }

    writeln!(
        out,
        "\nSelling price         {}  (profit/unit {})",
        format_currency_display(report.selected_price),
        format_currency_display(report.profit_per_unit)
    )?;

    let bep = &report.bep;
    if bep.is_valid {
        write!(
            out,
            "Break-even            {} units / {}",
            count(bep.bep_unit),
            format_currency_display(bep.bep_rupiah)
        )?;
        match report.days_to_bep {
            Some(days) => writeln!(out, "  (~{} days)", count(days))?,
            None => out.push('\n'),
        }
    } else {
        writeln!(
            out,
            "Break-even            not reachable: price does not cover variable cost"
        )?;
    }

    if let Some(plan) = &report.sales_plan {
        writeln!(out, "\nProfit target")?;
        writeln!(
            out,
            "  units / month       {}",
            count(plan.units_per_month)
        )?;
        writeln!(
            out,
            "  units / day         {}",
            format_localized_decimal(plan.units_per_day, 1)
        )?;
        writeln!(
            out,
            "  revenue             {}",
            format_currency_display(plan.potential_revenue)
        )?;
        writeln!(
            out,
            "  total cost          {}",
            format_currency_display(plan.total_production_cost)
        )?;
        writeln!(
            out,
            "  net profit          {}",
            format_currency_display(plan.projected_net_profit)
        )?;
        writeln!(
            out,
            "  at profit/unit      {} units",
            count(report.sales_needed)
        )?;
    }

    writeln!(
        out,
        "\nSimulation (every {} units up to {})",
        count(sample_step(config.max_units)),
        count(config.max_units)
    )?;
    writeln!(
        out,
        "  {:>8} {:>16} {:>16} {:>16}",
        "units", "revenue", "total cost", "profit"
    )?;
    for row in &report.simulation {
        writeln!(
            out,
            "  {:>8} {:>16} {:>16} {:>16}",
            count(row.units),
            format_currency_display(row.revenue),
            format_currency_display(row.total_cost),
            format_currency_display(row.profit)
        )?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1));
    if args.version {
        println!(
            "hpp {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let Some(path) = args.scenario.as_deref() else {
        bail!(USAGE);
    };
    info!(scenario = %path, json = args.json, "evaluating scenario");

    let mut scenario = load_scenario(Path::new(path))?;
    if let Some(price) = args.price.as_deref() {
        scenario.selling_price = PriceChoice::parse_lenient(price);
    }
    if let Some(profit) = args.target_profit.as_deref() {
        scenario.target_profit = Some(hpp_core::parse_localized_number(profit));
    }
    for field in fractional_counts(&scenario) {
        warn!(field, "count is fractional; quote id-ID amounts such as \"1.000\"");
    }

    let context = scenario.context();
    let overrides = args
        .suggestions
        .as_deref()
        .map(|p| {
            suggest_prices(
                Path::new(p),
                AdvisorConfig::from_env(),
                &scenario.product,
                &context,
            )
        })
        .transpose()?;
    let report = evaluate(
        &Evaluation::new(&context)
            .price(scenario.selling_price)
            .target_profit(scenario.target_profit)
            .daily_sales(scenario.daily_sales)
            .overrides(overrides.as_ref())
            .config(scenario.config.clone()),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&scenario.product, &report, &scenario.config)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpp_core::CostBasis;

    const SCENARIO: &str = r#"
product:
  name: Kopi Susu Gula Aren
  category: Minuman
targetSalesPerMonth: "600"
variableCosts:
  - name: Kopi bubuk
    usageAmount: 15
    usageUnit: g
    purchasePrice: "150.000"
    purchaseQuantity: 1
    purchaseUnit: kg
  - name: Cup
    cost: 2500
fixedCosts:
  - name: Sewa
    totalCost: "2.000.000"
  - name: Gaji
    totalCost: 1000000
sellingPrice: standard
targetProfit: "5.000.000"
dailySales: 20
config:
  maxUnits: 1000
"#;

    fn args(list: &[&str]) -> Args {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags() {
        let a = args(&[
            "--scenario",
            "s.yaml",
            "--price",
            "premium",
            "--json",
            "--unknown",
            "--target-profit",
            "1.000.000",
        ]);
        assert_eq!(a.scenario.as_deref(), Some("s.yaml"));
        assert_eq!(a.price.as_deref(), Some("premium"));
        assert_eq!(a.target_profit.as_deref(), Some("1.000.000"));
        assert!(a.json);
        assert!(!a.version);
        assert_eq!(a.suggestions, None);
    }

    #[test]
    fn scenario_reads_both_cost_shapes() {
        let s: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        assert_eq!(s.product.category, "Minuman");
        assert_eq!(s.target_sales_per_month, Decimal::from(600));
        assert!(matches!(s.variable_costs[0].basis, CostBasis::Derived(_)));
        assert!(matches!(s.variable_costs[1].basis, CostBasis::Direct { .. }));
        assert_eq!(s.fixed_costs[0].total_cost, Decimal::from(2_000_000));
        assert_eq!(s.target_profit, Some(Decimal::from(5_000_000)));
        assert_eq!(s.config.max_units, 1000);
        assert_eq!(s.config.days_per_month, 30);
    }

    #[test]
    fn minimal_scenario_uses_defaults() {
        let s: Scenario = serde_yaml::from_str("product: { name: Roti }").unwrap();
        assert_eq!(s.selling_price, PriceChoice::default());
        assert_eq!(s.target_profit, None);
        assert_eq!(s.config, CalcConfig::default());
        assert!(s.context().variable_costs.is_empty());
    }

    #[test]
    fn text_report_covers_all_sections() {
        let s: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        let ctx = s.context();
        let report = evaluate(
            &Evaluation::new(&ctx)
                .price(s.selling_price)
                .target_profit(s.target_profit)
                .daily_sales(s.daily_sales)
                .config(s.config.clone()),
        );
        // 2.250 + 2.500 variable, 3.000.000 / 600 fixed
        assert_eq!(report.hpp.hpp, Decimal::from(9_750));
        let text = render_text(&s.product, &report, &s.config).unwrap();
        assert!(text.starts_with("Kopi Susu Gula Aren (Minuman)"));
        assert!(text.contains("HPP                 Rp 9.750"));
        assert!(text.contains("[computed]"));
        assert!(text.contains("Break-even"));
        assert!(text.contains("Profit target"));
        assert!(text.contains("Simulation (every 20 units up to 1.000)"));
    }

    #[test]
    fn text_report_without_price_stops_after_tiers() {
        let ctx = CostingContext::default();
        let report = evaluate(&Evaluation::new(&ctx));
        let text = render_text(&ProductInfo::default(), &report, &CalcConfig::default()).unwrap();
        assert!(text.contains("No selling price selected."));
        assert!(!text.contains("Simulation"));
    }

    #[test]
    fn suggestions_mark_tiers_external() {
        let dir = std::env::temp_dir().join(format!("hpp-cli-{}-suggest", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("price-tiers")).unwrap();
        std::fs::write(dir.join("price-tiers").join("flash.txt"), "Maaf, coba lagi nanti.")
            .unwrap();
        std::fs::write(
            dir.join("price-tiers").join("pro.txt"),
            "```json\n{\"premium\": {\"price\": 25000, \"margin\": 150, \"explanation\": \"Kemasan eksklusif\"}}\n```",
        )
        .unwrap();
        let s: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        let ctx = s.context();
        let config = AdvisorConfig {
            api_key: None,
            models: vec!["flash".into(), "pro".into()],
        };
        let overrides = suggest_prices(&dir, config, &s.product, &ctx).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let report = evaluate(
            &Evaluation::new(&ctx)
                .price(PriceChoice::parse_lenient("premium"))
                .overrides(Some(&overrides)),
        );
        assert_eq!(report.selected_price, Decimal::from(25_000));
        let text = render_text(&s.product, &report, &CalcConfig::default()).unwrap();
        assert!(text.contains("[suggested]"));
        assert!(text.contains("Kemasan eksklusif"));
    }

    #[test]
    fn bundled_suggestions_answer_every_model() {
        let path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../demos/price-suggestions.txt"
        ));
        let s: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        let o = suggest_prices(path, AdvisorConfig::default(), &s.product, &s.context()).unwrap();
        assert_eq!(
            o.standard.and_then(|t| t.price),
            Some(Decimal::from(19_500))
        );
    }

    #[test]
    fn missing_suggestions_name_the_path() {
        let err = suggest_prices(
            Path::new("/nonexistent/hpp-suggestions"),
            AdvisorConfig::default(),
            &ProductInfo::default(),
            &CostingContext::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/hpp-suggestions"));
    }

    #[test]
    fn fractional_counts_are_flagged() {
        let s: Scenario =
            serde_yaml::from_str("targetSalesPerMonth: 2.500\ndailySales: 12.5").unwrap();
        assert_eq!(s.target_sales_per_month, Decimal::new(25, 1));
        assert_eq!(fractional_counts(&s), vec!["targetSalesPerMonth", "dailySales"]);

        let s: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        assert!(fractional_counts(&s).is_empty());
        // unquoted grouping with zero tail reads as a plain count
        let s: Scenario = serde_yaml::from_str("targetSalesPerMonth: 1.000").unwrap();
        assert_eq!(s.target_sales_per_month, Decimal::ONE);
        let s: Scenario = serde_yaml::from_str("targetSalesPerMonth: \"1.000\"").unwrap();
        assert_eq!(s.target_sales_per_month, Decimal::from(1_000));
    }

    #[test]
    fn usage_explains_quoting() {
        assert!(USAGE.starts_with("usage: hpp --scenario PATH"));
        assert!(USAGE.contains("must be quoted"));
    }
}
