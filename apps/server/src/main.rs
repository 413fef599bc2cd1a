mod config;
mod ipc;
mod main_lib;
mod scheduler;

use std::sync::Arc;

use config::Config;
use ipc::JsonLinesProcessMessageSink;
use main_lib::{build_state, init_tracing, run_command_loop, start};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();

    let ipc = Arc::new(JsonLinesProcessMessageSink::stdout());
    let state = build_state(&config, ipc).await?;
    start(&state).await?;

    tracing::info!("Listening for process commands on stdin");
    run_command_loop(&state, BufReader::new(tokio::io::stdin())).await
}
