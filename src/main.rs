mod analysis;
mod config;
mod errors;
mod market;
mod portfolio;
mod session;

use crate::analysis::gemini::GeminiAnalyst;
use crate::analysis::{explain_or_fallback, AnalysisGateway, OfflineAnalyst};
use crate::errors::SimError;
use crate::market::{MarketScenario, STOCK_TICKER};
use crate::portfolio::{metrics, OptionType};
use crate::session::SimSession;
use std::io::Write as _;
use std::str::FromStr;
use tokio::io::AsyncBufReadExt;

/// Expirations offered by the trade menu, in days.
const EXPIRATION_MENU: [u32; 5] = [5, 10, 20, 30, 60];
/// Contract count offered by the trade menu.
const MAX_CONTRACTS: u32 = 10;
/// How many trailing price points the chart command prints.
const CHART_WINDOW: usize = 15;

#[tokio::main]
async fn main() {
    // Structured logging on stderr; stdout belongs to the session.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("apex-sim starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let session = SimSession::new(MarketScenario::Classic, cfg.simulation_days, cfg.initial_cash);

    match cfg.gemini_api_key.clone() {
        Some(key) => {
            let analyst = GeminiAnalyst::new(key, cfg.gemini_base_url.clone(), cfg.gemini_model.clone());
            run_repl(session, analyst).await;
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, settled trades get the local fallback analysis");
            run_repl(session, OfflineAnalyst).await;
        }
    }
}

async fn run_repl<G: AnalysisGateway>(mut session: SimSession, analyst: G) {
    println!(
        "{STOCK_TICKER} options simulator -- {} market, {} days, ${:.2} cash",
        session.scenario(),
        session.horizon(),
        session.cash()
    );
    print_help();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    prompt();
    while let Ok(Some(line)) = lines.next_line().await {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["help"] => print_help(),
            ["quit"] | ["exit"] => break,
            ["scenario", name] => match MarketScenario::from_str(name) {
                Ok(scenario) => {
                    session.reset(scenario);
                    println!(
                        "new simulation started: {} market, day 0, ${:.2} cash",
                        session.scenario(),
                        session.cash()
                    );
                }
                Err(e) => {
                    let choices: Vec<String> =
                        MarketScenario::ALL.iter().map(|s| s.to_string()).collect();
                    println!("{e}; choose one of: {}", choices.join(", "));
                }
            },
            ["reset"] => {
                session.reset(session.scenario());
                println!("simulation restarted: {} market", session.scenario());
            }
            ["buy", kind, strike, days, contracts] => {
                handle_buy(&mut session, kind, strike, days, contracts);
            }
            ["next"] => handle_next(&mut session, &analyst).await,
            ["portfolio"] => print_portfolio(&session),
            ["chart"] => print_chart(&session),
            _ => println!("unrecognized command, try 'help'"),
        }
        prompt();
    }

    tracing::info!("apex-sim shutting down");
}

fn handle_buy(session: &mut SimSession, kind: &str, strike: &str, days: &str, contracts: &str) {
    let Ok(option_type) = OptionType::from_str(kind) else {
        println!("option type must be 'call' or 'put'");
        return;
    };
    let Ok(strike) = strike.parse::<f64>() else {
        println!("strike must be a number");
        return;
    };
    let Ok(days) = days.parse::<u32>() else {
        println!("expiration must be a number of days");
        return;
    };
    let Ok(contracts) = contracts.parse::<u32>() else {
        println!("contracts must be a number");
        return;
    };

    // Menu policy lives here, not in the engine: the ledger only defends
    // against malformed orders.
    if !EXPIRATION_MENU.contains(&days) {
        println!("expirations offered: 5, 10, 20, 30, 60 days");
        return;
    }
    if contracts == 0 || contracts > MAX_CONTRACTS {
        println!("contracts must be between 1 and {MAX_CONTRACTS}");
        return;
    }

    match session.open_position(option_type, strike, days, contracts) {
        Ok(pos) => {
            println!(
                "trade placed: {} {STOCK_TICKER} {:.2} {} (expires day {}, cost ${:.2})",
                contracts,
                strike,
                option_type.to_string().to_uppercase(),
                pos.expiration_day,
                pos.cost_basis
            );
            println!("cash remaining: ${:.2}", session.cash());
        }
        Err(e @ SimError::InsufficientFunds { .. }) => println!("{e}"),
        Err(e) => println!("trade rejected: {e}"),
    }
}

async fn handle_next<G: AnalysisGateway>(session: &mut SimSession, analyst: &G) {
    match session.advance_day() {
        Ok(outcome) => {
            println!(
                "day {} of {}: {STOCK_TICKER} at ${:.2}",
                outcome.new_day,
                session.horizon() - 1,
                outcome.spot
            );

            // Settlement is already committed; commentary is fetched one
            // position at a time, in settlement order.
            for pos in &outcome.settled {
                let stamp = chrono::Local::now().format("%H:%M:%S");
                println!(
                    "[{stamp}] settled: {STOCK_TICKER} {:.2} {} x{} -- P/L ${:+.2}, payout ${:.2}",
                    pos.strike_price,
                    pos.option_type,
                    pos.contracts,
                    pos.pnl,
                    pos.current_value
                );

                let text = explain_or_fallback(analyst, pos, outcome.spot, outcome.new_day).await;
                println!("--- analysis ---");
                println!("{text}");
                println!("----------------");
            }
        }
        Err(SimError::SimulationComplete) => {
            println!(
                "end of simulation; final account value ${:.2}. 'scenario <name>' or 'reset' starts a new run",
                session.total_value()
            );
        }
        Err(e) => println!("{e}"),
    }
}

fn print_portfolio(session: &SimSession) {
    let m = metrics::compute(session.ledger());
    println!(
        "day {} -- cash ${:.2}, open value ${:.2}, account total ${:.2}",
        session.current_day(),
        m.cash,
        m.open_value,
        m.total_value
    );
    println!(
        "realized P/L ${:+.2} over {} settled trades ({} wins, {:.0}% win rate)",
        m.realized_pnl,
        m.settled_trades,
        m.winning_trades,
        m.win_rate * 100.0
    );

    if session.open_positions().is_empty() {
        println!("no open positions");
        return;
    }
    for pos in session.open_positions() {
        println!(
            "  {} {:.2} x{} -- expires day {}, cost ${:.2}, value ${:.2}, P/L ${:+.2}",
            pos.option_type,
            pos.strike_price,
            pos.contracts,
            pos.expiration_day,
            pos.cost_basis,
            pos.current_value,
            pos.pnl
        );
    }
}

fn print_chart(session: &SimSession) {
    let path = session.path_to_date();
    let window = path.len().saturating_sub(CHART_WINDOW);
    for point in &path[window..] {
        println!("  day {:>3}  ${:.2}", point.day, point.price);
    }
}

fn print_help() {
    println!("commands:");
    println!("  scenario <name>                    restart under Classic|Bullish|Bearish|Volatile|Sideways");
    println!("  buy <call|put> <strike> <days> <n> open a position (days: 5/10/20/30/60, n: 1-10)");
    println!("  next                               advance one day (marks, settles, explains)");
    println!("  portfolio                          cash, account value, open positions");
    println!("  chart                              recent price history");
    println!("  reset                              restart the current scenario");
    println!("  quit");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
