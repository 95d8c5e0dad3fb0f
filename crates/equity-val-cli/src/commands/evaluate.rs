use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_val_core::{evaluate_value, EngineConfig};

use crate::input;

/// Arguments for a snapshot evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Path to the JSON snapshot (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Engine configuration file (.json, .yaml or .yml)
    #[arg(long)]
    pub config: Option<String>,

    /// Terminal growth rate (e.g. 0.01 for 1%), overrides the config file
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file is required (or pipe the snapshot on stdin)".into());
    };

    let config = load_config(&args)?;
    tracing::debug!(terminal_growth = %config.terminal_growth_rate, "configuration loaded");

    let output = evaluate_value(document, &config)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_config() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(EngineConfig::default())?)
}

/// File values first, then flag overrides.
fn load_config(args: &EvaluateArgs) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => input::file::read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(g) = args.terminal_growth {
        config.terminal_growth_rate = g;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equity_val_core::ValuationError;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "stock_price": 1250,
        "shares_outstanding_ex_treasury": 9000,
        "shares_unit": "thousands",
        "bps": 1100,
        "eps_actual": 88.5,
        "eps_forecast": 95,
        "dividend_annual": 40,
        "revenue": 120000,
        "operating_profit": 9000,
        "net_income": 6200,
        "operating_cf": 8100,
        "fcf": 500,
        "net_cash": 0,
        "ebitda": 12500,
        "net_assets": 9900,
        "effective_tax_rate": 0.30,
        "discount_rate": 0.08,
        "liquidation_value_per_share": 2000,
        "dcf_growth_middle": 0.03,
        "dcf_growth_strong": 0.06,
        "dcf_years": 5
    }"#;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn args(input: &tempfile::NamedTempFile) -> EvaluateArgs {
        EvaluateArgs {
            input: Some(input.path().to_string_lossy().into_owned()),
            config: None,
            terminal_growth: None,
        }
    }

    #[test]
    fn test_evaluate_from_file() {
        let snapshot = write_temp(".json", SNAPSHOT);
        let value = run_evaluate(args(&snapshot)).unwrap();

        assert_eq!(value["result"]["per_share"]["per_forecast"]["value"], "13.16");
        assert_eq!(value["result"]["enterprise"]["market_cap"], "11250000000");
        assert_eq!(value["result"]["rating"]["tier"], "avoid");
        assert_eq!(value["result"]["dcf"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_flag_overrides_config_file() {
        let snapshot = write_temp(".json", SNAPSHOT);
        let config = write_temp(".yaml", "terminal_growth_rate: \"0.005\"\nmax_dcf_years: 30\n");
        let mut a = args(&snapshot);
        a.config = Some(config.path().to_string_lossy().into_owned());
        a.terminal_growth = Some(Decimal::new(1, 2));

        let loaded = load_config(&a).unwrap();
        assert_eq!(loaded.terminal_growth_rate, Decimal::new(1, 2));
        assert_eq!(loaded.max_dcf_years, 30);

        let value = run_evaluate(a).unwrap();
        assert_eq!(value["assumptions"]["terminal_growth_rate"], "0.01");
    }

    #[test]
    fn test_divergent_snapshot_surfaces_core_error() {
        let snapshot = write_temp(".json", &SNAPSHOT.replace("\"discount_rate\": 0.08", "\"discount_rate\": 0.03"));
        let err = run_evaluate(args(&snapshot)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValuationError>(),
            Some(ValuationError::DivergentScenario { .. })
        ));
    }

    #[test]
    fn test_default_config_document() {
        let value = run_config().unwrap();
        assert_eq!(value["max_dcf_years"], 50);
        assert_eq!(value["terminal_growth_rate"], "0");
        assert!(value["rating"].is_object());
    }
}
