use crate::cli::ui::{self, StyleType};
use crate::cli::{detail, markets, portfolio};
use crate::error::ValidationError;
use crate::filter::FilterSpec;
use crate::market::Currency;
use crate::market_provider::MarketDataProvider;
use crate::session::{DetailState, Session};
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Outcome of one dashboard command.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Interactive dashboard loop: loads the session once, then reads
/// commands from stdin until `quit` or EOF.
pub async fn run(provider: &dyn MarketDataProvider, spec: FilterSpec) -> Result<()> {
    let mut session = Session::new(spec);

    let pb = ui::new_spinner("Loading dashboard...");
    session.refresh(provider).await;
    pb.finish_and_clear();

    render_overview(&session);
    print_help();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if handle_command(&mut session, provider, line.trim()).await == Action::Quit {
            break;
        }
    }
    Ok(())
}

/// Parses and executes one command line against the session. Split from
/// the stdin loop so the command surface can be driven directly in tests.
pub async fn handle_command(
    session: &mut Session,
    provider: &dyn MarketDataProvider,
    line: &str,
) -> Action {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Action::Continue;
    };

    match command {
        "quit" | "q" | "exit" => return Action::Quit,
        "help" | "h" => print_help(),
        "list" | "ls" => render_overview(session),
        "refresh" | "r" => {
            session.refresh(provider).await;
            render_overview(session);
        }
        "select" => match parts.next() {
            Some(coin_id) => {
                session.select_coin(provider, coin_id).await;
                render_detail(session);
            }
            None => print_usage("select <coin-id>"),
        },
        "detail" | "d" => render_detail(session),
        "currency" | "c" => match parts.next() {
            Some(code) => match code.parse::<Currency>() {
                Ok(currency) => {
                    session.set_currency(provider, currency).await;
                    render_overview(session);
                }
                Err(err) => print_error(&err),
            },
            None => print_usage("currency <usd|eur|idr|sol>"),
        },
        "filter" | "f" => {
            let keyword = parts.collect::<Vec<_>>().join(" ");
            let mut spec = session.filters().clone();
            spec.keyword = keyword;
            session.apply_filters(provider, spec).await;
            render_overview(session);
        }
        "min" => match apply_price_bound(session, provider, parts.next(), true).await {
            Ok(()) => render_overview(session),
            Err(err) => print_error(&err),
        },
        "max" => match apply_price_bound(session, provider, parts.next(), false).await {
            Ok(()) => render_overview(session),
            Err(err) => print_error(&err),
        },
        "gainers" | "g" => {
            let mut spec = session.filters().clone();
            spec.positive_change_only = !spec.positive_change_only;
            let state = if spec.positive_change_only { "on" } else { "off" };
            session.apply_filters(provider, spec).await;
            println!("Gainers-only filter {state}.");
            render_overview(session);
        }
        "add" => match (parts.next(), parts.next()) {
            (Some(coin_id), Some(quantity)) => match session.add_holding(coin_id, quantity) {
                Ok(()) => render_portfolio(session),
                Err(err) => print_error(&err),
            },
            _ => print_usage("add <coin-id> <quantity>"),
        },
        "reset" => {
            session.reset_portfolio();
            println!("Portfolio cleared.");
        }
        "portfolio" | "p" => render_portfolio(session),
        other => println!("Unknown command '{other}'. Type 'help' for commands."),
    }
    Action::Continue
}

/// Replaces one price bound of the filter spec, validating the pair.
/// The literal `none` clears the bound.
async fn apply_price_bound(
    session: &mut Session,
    provider: &dyn MarketDataProvider,
    arg: Option<&str>,
    is_min: bool,
) -> Result<(), ValidationError> {
    let bound = match arg {
        None | Some("none") => None,
        Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
            ValidationError(format!("'{raw}' is not a valid price"))
        })?),
    };
    let current = session.filters();
    let (min, max) = if is_min {
        (bound, current.max_price)
    } else {
        (current.min_price, bound)
    };
    let spec = FilterSpec::new(
        current.keyword.clone(),
        min,
        max,
        current.currency,
        current.positive_change_only,
    )?;
    session.apply_filters(provider, spec).await;
    Ok(())
}

fn render_overview(session: &Session) {
    ui::print_separator();
    let filtered = session.filtered_coins();
    if filtered.is_empty() {
        println!("No coins match the current filters.");
    } else {
        println!("{}", markets::render_table(&filtered, session.filters()));
    }
    if let Some(updated) = session.last_updated() {
        let line = format!("Last updated: {}", updated.format("%Y-%m-%d %H:%M UTC"));
        println!("{}", ui::style_text(&line, StyleType::Subtle));
    }
    if let Some(message) = session.last_error() {
        let line = format!("Last refresh failed: {message} (showing previous data)");
        println!("{}", ui::style_text(&line, StyleType::Error));
    }
}

fn render_detail(session: &Session) {
    ui::print_separator();
    match session.detail() {
        DetailState::Idle => println!("No coin selected. Use 'select <coin-id>'."),
        DetailState::Loading => println!("Loading..."),
        DetailState::Ready { detail: d, chart } => {
            println!("{}", detail::render(d, chart, session.currency()));
        }
        DetailState::Errored(message) => {
            println!("{}", ui::style_text(message, StyleType::Error));
        }
    }
}

fn render_portfolio(session: &Session) {
    ui::print_separator();
    if session.portfolio().is_empty() {
        println!("Portfolio is empty. Use 'add <coin-id> <quantity>'.");
        return;
    }
    let valuations = session.valuations();
    println!(
        "{}",
        portfolio::render_valuations(&valuations, session.currency())
    );
}

fn print_error(err: &ValidationError) {
    println!("{}", ui::style_text(&err.to_string(), StyleType::Error));
}

fn print_usage(usage: &str) {
    println!("Usage: {usage}");
}

fn print_help() {
    println!(
        "\nCommands:\n  \
         list                 show the filtered market table\n  \
         select <coin-id>     load detail and 7d chart for a coin\n  \
         detail               re-print the current detail pane\n  \
         filter [keyword]     set (or clear) the keyword filter\n  \
         min <price|none>     set the minimum price bound\n  \
         max <price|none>     set the maximum price bound\n  \
         gainers              toggle the positive-24h-change filter\n  \
         currency <code>      switch quote currency (usd, eur, idr, sol)\n  \
         add <coin-id> <qty>  add a holding to the portfolio\n  \
         portfolio            value the current holdings\n  \
         reset                clear all holdings\n  \
         refresh              refetch markets and the selected coin\n  \
         quit                 exit\n"
    );
}
