use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use metric_sim_sdk::SimClient;
use rand::Rng;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "sim-cli")]
#[command(about = "Traffic driver for the metric-sim failure simulator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one health check (may flip simulated dependencies)
    Health,
    /// Submit a single order
    Order {
        order_id: String,
        /// Force a failure: db or api_timeout
        #[arg(short, long)]
        error: Option<String>,
    },
    /// Print the Prometheus scrape output
    Metrics,
    /// Generate mixed traffic and summarize response codes
    Load {
        #[arg(short = 'n', long, default_value_t = 100)]
        requests: usize,
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
        /// Fraction of orders sent with an invalid ID
        #[arg(long, default_value_t = 0.05)]
        invalid_rate: f64,
        /// Fraction of orders forcing a database error
        #[arg(long, default_value_t = 0.05)]
        db_error_rate: f64,
        /// Fraction of orders forcing a third-party timeout
        #[arg(long, default_value_t = 0.05)]
        timeout_rate: f64,
        /// Run a health check every N orders (0 disables)
        #[arg(long, default_value_t = 10)]
        health_every: usize,
    },
}

/// Shape of one generated order.
#[derive(Debug, Clone, Copy)]
enum Scenario {
    Normal,
    Invalid,
    DbError,
    Timeout,
}

struct Mix {
    invalid: f64,
    db: f64,
    timeout: f64,
}

impl Mix {
    fn pick<R: Rng>(&self, rng: &mut R) -> Scenario {
        let draw: f64 = rng.gen();
        if draw < self.invalid {
            Scenario::Invalid
        } else if draw < self.invalid + self.db {
            Scenario::DbError
        } else if draw < self.invalid + self.db + self.timeout {
            Scenario::Timeout
        } else {
            Scenario::Normal
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = SimClient::new(&cli.url);

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Commands::Order { order_id, error } => {
            let outcome = client.process_order(&order_id, error.as_deref()).await?;
            println!(
                "{} in {:.3}s\n{}",
                outcome.status,
                outcome.elapsed.as_secs_f64(),
                serde_json::to_string_pretty(&outcome.body)?
            );
        }
        Commands::Metrics => {
            print!("{}", client.metrics().await?);
        }
        Commands::Load {
            requests,
            concurrency,
            invalid_rate,
            db_error_rate,
            timeout_rate,
            health_every,
        } => {
            let mix = Mix {
                invalid: invalid_rate,
                db: db_error_rate,
                timeout: timeout_rate,
            };
            run_load(client, requests, concurrency.max(1), mix, health_every).await?;
        }
    }

    Ok(())
}

async fn run_load(
    client: SimClient,
    requests: usize,
    concurrency: usize,
    mix: Mix,
    health_every: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(client);
    let mut tasks = JoinSet::new();
    let mut statuses: BTreeMap<String, usize> = BTreeMap::new();
    let mut failures = 0usize;
    let start = Instant::now();

    for i in 0..requests {
        if health_every > 0 && i % health_every == 0 {
            match client.health().await {
                Ok(health) => *statuses.entry(format!("health:{}", health.status)).or_default() += 1,
                Err(e) => {
                    eprintln!("health check failed: {}", e);
                    failures += 1;
                }
            }
        }

        while tasks.len() >= concurrency {
            if let Some(joined) = tasks.join_next().await {
                tally(joined, &mut statuses, &mut failures);
            }
        }

        let scenario = mix.pick(&mut rand::thread_rng());
        let client = Arc::clone(&client);
        tasks.spawn(async move {
            let order_id = match scenario {
                Scenario::Invalid => "invalid".to_string(),
                _ => format!("order-{}", i),
            };
            let error = match scenario {
                Scenario::DbError => Some("db"),
                Scenario::Timeout => Some("api_timeout"),
                _ => None,
            };
            client.process_order(&order_id, error).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        tally(joined, &mut statuses, &mut failures);
    }

    println!(
        "{} orders against {} in {:.2}s ({} transport failures)",
        requests,
        client.base_url(),
        start.elapsed().as_secs_f64(),
        failures
    );
    for (status, count) in statuses {
        println!("  {:<24} {}", status, count);
    }
    Ok(())
}

fn tally(
    joined: Result<Result<metric_sim_sdk::OrderOutcome, reqwest::Error>, tokio::task::JoinError>,
    statuses: &mut BTreeMap<String, usize>,
    failures: &mut usize,
) {
    match joined {
        Ok(Ok(outcome)) => *statuses.entry(format!("order:{}", outcome.status.as_u16())).or_default() += 1,
        Ok(Err(e)) => {
            eprintln!("order failed: {}", e);
            *failures += 1;
        }
        Err(e) => {
            eprintln!("task failed: {}", e);
            *failures += 1;
        }
    }
}
