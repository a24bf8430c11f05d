use anyhow::{Context, anyhow};
use clap::Parser;
use networth::api::{Cli, Command, run_http_server, run_predict};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Serve { port } => run_http_server(port)
            .await
            .with_context(|| format!("server on port {port} failed")),
        Command::Predict(args) => {
            let response = tokio::task::spawn_blocking(move || run_predict(args))
                .await
                .context("prediction task panicked")?
                .map_err(|msg| anyhow!(msg))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}
