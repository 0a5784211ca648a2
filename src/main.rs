// src/main.rs

use buildag::errors::BuildError;
use buildag::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("buildag: failed to initialise logging: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(summary) if summary.all_succeeded() => {}
        Ok(summary) => {
            eprintln!("buildag: {} action(s) failed", summary.failed.len());
            std::process::exit(1);
        }
        Err(err @ BuildError::CyclicDependency(_)) => {
            eprintln!("buildag error: {err}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("buildag error: {err:?}");
            std::process::exit(1);
        }
    }
}
