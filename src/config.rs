use std::path::PathBuf;

use clap::Parser;

/// Dataset looked up in the working directory when none is given.
pub const DEFAULT_DATA_FILE: &str = "new_IN_youtube_trending_data.csv";

/// Command-line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "trendviz", version, about = "Serve charts over a trending-video dataset")]
pub struct Config {
    /// CSV file, or zip archive containing one.
    #[arg(long, env = "TRENDVIZ_DATA", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    #[arg(long, env = "TRENDVIZ_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "TRENDVIZ_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Chart width in pixels.
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(200..=4000))]
    pub width: u32,

    /// Chart height in pixels.
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(150..=4000))]
    pub height: u32,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn canvas(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
