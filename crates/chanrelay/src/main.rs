use std::sync::Arc;

use chanrelay_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chanrelay_core::logging::init("chanrelay")?;

    let cfg = Arc::new(Config::load()?);

    chanrelay_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| anyhow::anyhow!("telegram bot failed: {e}"))?;

    tracing::info!("dispatcher stopped");
    Ok(())
}
