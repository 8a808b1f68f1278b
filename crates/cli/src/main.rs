//! Command Line Interface for the liquidity position backtester.
use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use lp_backtest_data::{Database, DatabaseConfig};
use lp_backtest_domain::entities::{Pool, Position};
use lp_backtest_domain::math::tick_to_price;
use lp_backtest_domain::value_objects::BacktestResult;
use lp_backtest_simulation::prelude::*;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lp-backtest")]
#[command(about = "Concentrated liquidity position backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List raw swaps of a pool, newest first
    Swaps {
        #[command(flatten)]
        window: PoolWindow,

        /// Rows to fetch
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Replay a position against historical swaps
    Backtest(BacktestArgs),
}

#[derive(Args, Debug, Clone)]
struct PoolWindow {
    /// Pool contract address
    #[arg(long)]
    pool: String,

    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the window (YYYY-MM-DD), matched at midnight
    #[arg(long)]
    end: NaiveDate,
}

impl PoolWindow {
    fn bounds(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        if self.end < self.start {
            bail!("end date {} is before start date {}", self.end, self.start);
        }
        Ok((
            self.start.and_time(NaiveTime::MIN),
            self.end.and_time(NaiveTime::MIN),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    /// Keep the initial range
    None,
    /// Recenter every `--interval-hours`
    Time,
    /// Recenter as soon as the price leaves the range
    OutOfRange,
    /// Recenter after `--duration-hours` out of range
    OutOfRangeDuration,
    /// Combine the time and out-of-range-duration triggers with `--mode`
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    And,
    Or,
}

impl From<ModeArg> for LogicMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::And => LogicMode::And,
            ModeArg::Or => LogicMode::Or,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct BacktestArgs {
    #[command(flatten)]
    window: PoolWindow,

    /// Lower tick of the initial range
    #[arg(long, allow_negative_numbers = true)]
    tick_lower: i32,

    /// Upper tick of the initial range
    #[arg(long, allow_negative_numbers = true)]
    tick_upper: i32,

    /// Deposited token0 amount
    #[arg(long)]
    amount0: Decimal,

    /// Deposited token1 amount
    #[arg(long)]
    amount1: Decimal,

    /// Pool fee rate as a fraction (0.003 = 0.3%)
    #[arg(long, default_value = "0.003")]
    fee: Decimal,

    #[arg(long, default_value = "token0")]
    token0: String,

    #[arg(long, default_value = "token1")]
    token1: String,

    /// Rebalancing strategy
    #[arg(long, value_enum, default_value_t = StrategyKind::None)]
    strategy: StrategyKind,

    /// Interval of the time-triggered strategy
    #[arg(long, allow_negative_numbers = true, default_value_t = 24)]
    interval_hours: i64,

    /// Out-of-range time tolerated before rebalancing
    #[arg(long, allow_negative_numbers = true, default_value_t = 6)]
    duration_hours: i64,

    /// How the multi strategy combines its triggers
    #[arg(long, value_enum, default_value_t = ModeArg::Or)]
    mode: ModeArg,

    /// Share of the range width placed below the current tick, in [0, 1]
    #[arg(long, default_value_t = 0.5)]
    bias: f64,

    /// Record swap time instead of wall-clock time on time-triggered rebalances
    #[arg(long)]
    simulated_clock: bool,

    /// Measure out-of-range duration from the moment the price left the range
    #[arg(long)]
    track_transitions: bool,

    /// Rows fetched per query
    #[arg(long, default_value_t = 1000)]
    page_size: i64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl BacktestArgs {
    fn position(&self) -> Position {
        let pool = Pool::new(&self.window.pool, &self.token0, &self.token1, self.fee);
        Position::new(
            self.tick_lower,
            self.tick_upper,
            self.amount0,
            self.amount1,
            pool,
        )
    }

    fn time_triggered(&self) -> Result<TimeTriggeredRebalancer> {
        let clock = if self.simulated_clock {
            RebalanceClock::Simulated
        } else {
            RebalanceClock::WallClock
        };
        let interval = Duration::try_hours(self.interval_hours)
            .with_context(|| format!("interval of {} hours is out of range", self.interval_hours))?;
        Ok(TimeTriggeredRebalancer::new(interval)?.with_clock(clock))
    }

    fn out_of_range_duration(&self) -> Result<OutOfRangeDurationRebalancer> {
        let duration = Duration::try_hours(self.duration_hours)
            .with_context(|| format!("duration of {} hours is out of range", self.duration_hours))?;
        Ok(OutOfRangeDurationRebalancer::new(duration)?.track_transitions(self.track_transitions))
    }

    fn rebalancer(&self) -> Result<Option<Rebalancer>> {
        let rebalancer = match self.strategy {
            StrategyKind::None => return Ok(None),
            StrategyKind::Time => self.time_triggered()?.into(),
            StrategyKind::OutOfRange => OutOfRangeRebalancer::new().into(),
            StrategyKind::OutOfRangeDuration => self.out_of_range_duration()?.into(),
            StrategyKind::Multi => MultiConditionRebalancer::new(
                vec![
                    self.time_triggered()?.into(),
                    self.out_of_range_duration()?.into(),
                ],
                self.mode.into(),
            )
            .into(),
        };
        Ok(Some(rebalancer))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = DatabaseConfig::from_env().context("database configuration")?;
    let database = Database::connect(&config).await?;
    let swaps = database.swaps();

    match cli.command {
        Commands::Swaps {
            window,
            limit,
            offset,
        } => {
            let (start, end) = window.bounds()?;
            let records = swaps
                .find_page(&window.pool, start, end, limit, offset)
                .await?;

            let mut table = Table::new();
            table.add_row(row![
                "Time", "Block", "Tick", "Volume 0", "Volume 1", "Liquidity", "Tx"
            ]);
            for record in &records {
                table.add_row(row![
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.block_number,
                    record.tick,
                    record.volume_token0,
                    record.volume_token1,
                    record.liquidity,
                    record.tx_hash
                ]);
            }
            table.printstd();
            println!("{} swaps", records.len());
        }
        Commands::Backtest(args) => {
            let (start, end) = args.window.bounds()?;
            let series = swaps
                .load_series(&args.window.pool, start, end, args.page_size)
                .await?;
            info!(swaps = series.len(), "Swap series ready");

            let mut runner = BacktestRunner::new(
                args.position(),
                series,
                ActivityTracker,
                FeeCalculator,
                args.bias,
            )?
            .with_optional_rebalancer(args.rebalancer()?);
            let result = runner.run()?;

            if args.json {
                println!("{}", json_report(&runner, &result)?);
            } else {
                print_report(&runner, &result);
            }
        }
    }

    Ok(())
}

/// Price bounds of the position's range, token1 per token0. `None` when a bound
/// does not fit in a `Decimal`.
fn price_range(position: &Position) -> Option<(Decimal, Decimal)> {
    let lower = tick_to_price(position.tick_lower).ok()?;
    let upper = tick_to_price(position.tick_upper).ok()?;
    Some((lower, upper))
}

fn json_report(runner: &BacktestRunner, result: &BacktestResult) -> Result<String> {
    let position = runner.position();
    let report = serde_json::json!({
        "position_id": position.id(runner.created_at()).to_string(),
        "result": result,
        "time_in_range": runner.activity_series().time_in_range(),
        "final_range": [position.tick_lower, position.tick_upper],
        "final_price_range": price_range(position),
        "rebalances": runner.range_history(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

fn print_report(runner: &BacktestRunner, result: &BacktestResult) {
    let position = runner.position();

    let mut table = Table::new();
    table.add_row(row!["Position", position.id(runner.created_at())]);
    table.add_row(row!["Swaps", runner.swap_series().len()]);
    table.add_row(row![
        "Time in range",
        format!("{:.1}%", runner.activity_series().time_in_range() * 100.0)
    ]);
    table.add_row(row![
        format!("Fees {}", position.pool.token0),
        result.total_fees_token0
    ]);
    table.add_row(row![
        format!("Fees {}", position.pool.token1),
        result.total_fees_token1
    ]);
    table.add_row(row!["APR", format!("{:.4}%", result.apr)]);
    table.add_row(row!["Rebalances", runner.rebalance_count()]);
    table.add_row(row![
        "Final range",
        format!("[{}, {}]", position.tick_lower, position.tick_upper)
    ]);
    if let Some((lower, upper)) = price_range(position) {
        table.add_row(row![
            format!("Price range ({} per {})", position.pool.token1, position.pool.token0),
            format!("[{lower:.6}, {upper:.6}]")
        ]);
    }
    table.printstd();

    if !runner.range_history().is_empty() {
        let mut history = Table::new();
        history.add_row(row!["Time", "Tick", "Old range", "New range"]);
        for change in runner.range_history() {
            history.add_row(row![
                change.timestamp.format("%Y-%m-%d %H:%M:%S"),
                change.tick,
                format!("[{}, {}]", change.old_range.0, change.old_range.1),
                format!("[{}, {}]", change.new_range.0, change.new_range.1)
            ]);
        }
        history.printstd();
    }
}
