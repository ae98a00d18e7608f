use anyhow::Result;
use commitstreak::cli::run_cli;
use tracing::error;

fn main() -> Result<()> {
    // A check is a handful of sequential requests, one thread is plenty
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
