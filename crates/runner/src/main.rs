use log::{error, info};
use tempo_runner::config::{load_config, load_default_config};
use tempo_runner::{Backtest, BacktestConfig, LiveSession, RunnerError, SessionConfig};

fn print_help() {
    eprintln!(
        r#"tempo - TWAP backtest and paper session runner

USAGE:
    tempo [OPTIONS]

OPTIONS:
    --config <PATH>     Load a session from a JSON file (default: embedded session)
    --backtest <NAME>   Run only the named backtest
    --live              Run the selected orders together on the system clock
                        against the paper venue instead of backtesting
    --json              Print each report as JSON on stdout
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)
"#
    );
}

fn required_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {flag} requires an argument");
            std::process::exit(1);
        }
    }
}

async fn run_live(
    session: &SessionConfig,
    selected: Vec<BacktestConfig>,
) -> Result<(), RunnerError> {
    let report = LiveSession::new(session, selected).run().await?;
    for outcome in &report.instances {
        info!("{} (algo {}): {:?}", outcome.name, outcome.id, outcome.final_state);
    }
    for (symbol, stats) in &report.books {
        info!(
            "{symbol}: filled {} over {} child orders, {} canceled, avg {:?}",
            stats.filled_qty,
            stats.placed,
            stats.canceled,
            stats.avg_fill_price.map(|p| p.round_dp(4)),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut only: Option<String> = None;
    let mut json = false;
    let mut live = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(required_value(&args, i, "--config"));
            }
            "--backtest" | "-b" => {
                i += 1;
                only = Some(required_value(&args, i, "--backtest"));
            }
            "--json" => json = true,
            "--live" => live = true,
            arg => {
                eprintln!("Unknown argument: {arg}");
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let session = match config_path {
        Some(path) => {
            info!("Loading session from: {path}");
            load_config(&path)?
        }
        None => load_default_config()?,
    };
    session.validate()?;

    let selected: Vec<_> = session
        .backtests
        .iter()
        .filter(|b| only.as_deref().is_none_or(|name| b.name == name))
        .collect();
    if selected.is_empty() {
        error!("No backtest matches {:?}", only.unwrap_or_default());
        std::process::exit(1);
    }

    if live {
        let selected = selected.into_iter().cloned().collect();
        return run_live(&session, selected).await;
    }

    for config in selected {
        let seed = session.seed_for(config);
        let report = Backtest::from_config(config, seed).run()?;
        info!(
            "{}: {:?}, filled {} of {} ({:.1}%), avg {:?} vs vwap {:?}, slippage {:?} bps",
            report.name,
            report.final_state,
            report.filled_qty,
            report.target_qty,
            report.fill_ratio() * rust_decimal::Decimal::ONE_HUNDRED,
            report.avg_fill_price.map(|p| p.round_dp(4)),
            report.market_vwap.map(|p| p.round_dp(4)),
            report.slippage_bps(),
        );
        info!("{}: decisions {:?}", report.name, report.decisions);
        if json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("{}: cannot serialize report: {e}", report.name),
            }
        }
    }
    Ok(())
}
