// src/main.rs

use renderbench::{cli, logging, report, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("renderbench error: {err:?}");
            std::process::exit(2);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let reports = run(args).await?;
    Ok(report::overall_exit_code(&reports))
}
