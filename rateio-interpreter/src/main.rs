mod config;

use std::{env, fs, io, process};

use config::{ConfigError, InterpreterConfig};
use rateio_domain::{Ledger, SettlementError};
use rateio_presentation::{labels, settlement_presenter::SettlementPresenter};
use thiserror::Error;

#[derive(Debug, Error)]
enum InterpreterError {
    #[error("Usage: rateio_interpreter <ledger.json>")]
    Usage,
    #[error("Failed to read '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("Invalid ledger in '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

fn main() {
    config::init_logging();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), InterpreterError> {
    let Some(path) = env::args().nth(1) else {
        return Err(InterpreterError::Usage);
    };
    let config = InterpreterConfig::from_env()?;

    let contents = fs::read_to_string(&path).map_err(|source| InterpreterError::Read {
        path: path.clone(),
        source,
    })?;
    let ledger = parse_ledger(&path, &contents)?;

    print!("{}", render_ledger(&ledger, &config)?);
    Ok(())
}

fn parse_ledger(path: &str, contents: &str) -> Result<Ledger, InterpreterError> {
    serde_json::from_str(contents).map_err(|source| InterpreterError::Parse {
        path: path.to_owned(),
        source,
    })
}

fn render_ledger(ledger: &Ledger, config: &InterpreterConfig) -> Result<String, InterpreterError> {
    if ledger.expenses.is_empty() {
        return Ok(format!("{}\n", labels::NO_EXPENSES));
    }

    let settlement = ledger.settle(config.context)?;
    tracing::debug!(
        transfer_count = settlement.transfers.len(),
        warning_count = settlement.warnings.len(),
        "Settled ledger"
    );

    let view = SettlementPresenter::render(&settlement, ledger);
    let mut output = view.totals_table;
    output.push('\n');
    match view.transfer_table {
        Some(table) => output.push_str(&table),
        None => {
            let status = if settlement.is_settled() {
                labels::ALL_SETTLED
            } else {
                labels::NO_SETTLING_TRANSFERS
            };
            output.push_str(status);
            output.push('\n');
        }
    }
    if !view.notes.is_empty() {
        output.push('\n');
        for note in &view.notes {
            output.push_str(note);
            output.push('\n');
        }
    }

    Ok(output)
}
