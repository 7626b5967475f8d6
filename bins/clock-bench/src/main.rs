mod cmd;

use clap::Parser;
use cmd::config::{BenchArgs, Effective};
use cmd::report::ConsoleReport;

#[derive(Parser)]
#[command(name = "clock-bench", about = "Hash-store layout benchmark for clock records")]
struct Cli {
    #[command(flatten)]
    args: BenchArgs,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let eff = match Effective::new(&cli.args) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut report = ConsoleReport::new(std::io::stdout());
    if let Err(e) = cmd::bench::run(&eff, &mut report).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
