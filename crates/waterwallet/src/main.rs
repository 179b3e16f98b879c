//! Run one consumption prediction and print the allocation reply as JSON.
//!
//! # Examples
//!
//! ```sh
//! # Defaults only (heuristic unless a model is configured)
//! waterwallet
//!
//! # Partial features from a file, with a trained model
//! waterwallet --input today.json --model-path models/household.toml
//!
//! # Pipe features from stdin
//! echo '{"temperature_C": 36, "season": "summer"}' | waterwallet --stdin --pretty
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde_json::Value;
use waterwallet::logging;
use waterwallet::prelude::*;
use waterwallet::validation;

/// Predict household water consumption and split it across zones.
#[derive(Parser)]
#[command(name = "waterwallet")]
struct Cli {
    /// JSON file holding a partial feature object
    #[arg(long, conflicts_with = "stdin")]
    input: Option<PathBuf>,

    /// Read the partial feature object from stdin
    #[arg(long)]
    stdin: bool,

    /// TOML model artifact; without it the heuristic is used
    #[arg(long, env = "ALLOCATION_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Pretty-print the reply
    #[arg(long)]
    pretty: bool,

    /// Include which path produced the prediction
    #[arg(long)]
    show_source: bool,
}

fn read_input(cli: &Cli) -> Result<Option<Vec<u8>>, String> {
    if let Some(path) = &cli.input {
        let raw =
            std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Ok(Some(raw))
    } else if cli.stdin {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(Some(buf))
    } else {
        Ok(None)
    }
}

/// Plan from raw JSON input. Blank input and `{}` use the defaults.
fn reply_for(
    planner: &AllocationPlanner,
    raw: Option<&[u8]>,
    show_source: bool,
) -> Result<Value, String> {
    let overrides = match raw {
        Some(raw) => validation::parse_optional_object(raw).map_err(|e| e.to_string())?,
        None => None,
    };
    let plan = match &overrides {
        Some(map) => planner.plan_checked(map).map_err(|e| e.to_string())?,
        None => planner.plan(None),
    };

    let mut reply = serde_json::to_value(&plan.response).map_err(|e| e.to_string())?;
    if show_source {
        reply["prediction_source"] =
            serde_json::to_value(plan.prediction.source).map_err(|e| e.to_string())?;
    }
    Ok(reply)
}

fn run(cli: &Cli) -> Result<String, String> {
    let raw = read_input(cli)?;
    let planner = AllocationPlanner::new(Predictor::from_path(cli.model_path.as_deref()));
    let reply = reply_for(&planner, raw.as_deref(), cli.show_source)?;
    let text = if cli.pretty {
        serde_json::to_string_pretty(&reply)
    } else {
        serde_json::to_string(&reply)
    };
    text.map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(logging::DEFAULT_DIRECTIVES);

    match run(&cli) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
