// main.rs
// Payment-chase job: runs one reconciliation pass per user against MongoDB,
// then exits. Whatever schedules it (cron, a manual trigger, a queue
// worker) may fire it as often as it likes; passes are idempotent.

use chrono::Utc;
use dotenvy::dotenv;
use tracing::info;

use facturapp::runner::PassRunner;
use facturapp::store::{init_state, user_ids};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let state = init_state().await?;
    let users = user_ids(&state).await?;
    info!(users = users.len(), "starting reconciliation sweep");

    let runner = PassRunner::new();
    let today = Utc::now().date_naive();
    let results = runner.sweep(&state, &users, today).await;

    let failures = results.iter().filter(|(_, r)| r.is_err()).count();
    info!(passes = results.len(), failures, "sweep finished");
    if failures > 0 {
        anyhow::bail!("{failures} reconciliation passes failed");
    }
    Ok(())
}
