mod app;
mod chart;
mod color;
mod config;
mod data;
mod error;
mod state;
mod web;

use anyhow::Context;
use clap::Parser;

use config::Config;
use data::model::Dataset;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // Loaded exactly once; a failure leaves the server up with no data.
    let dataset = match data::loader::load_file(&config.data) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Error loading dataset: {e}");
            Dataset::empty()
        }
    };

    let state = AppState::new(dataset, config.canvas()).context("compiling page templates")?;
    app::serve(state, &config.addr())
        .await
        .with_context(|| format!("serving on {}", config.addr()))
}
