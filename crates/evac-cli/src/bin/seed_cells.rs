//! CLI tool to seed the Evac server with a synthetic prediction batch.
//!
//! Generates a cluster of danger cells around a center point, for demos
//! and detour testing without the real prediction pipeline.

use chrono::Utc;
use clap::Parser;
use evac_core::CellUpload;
use rand::Rng;

/// Upload a synthetic danger-cell cluster to the Evac server
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Evac Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Cluster center latitude
    #[arg(long, default_value_t = 37.5010)]
    lat: f64,

    /// Cluster center longitude
    #[arg(long, default_value_t = 127.0380)]
    lon: f64,

    /// Number of cells to generate
    #[arg(long, default_value_t = 12)]
    count: usize,

    /// Cluster radius in degrees
    #[arg(long, default_value_t = 0.004)]
    spread: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut rng = rand::rng();
    let now = Utc::now();

    let cells: Vec<CellUpload> = (0..args.count)
        .map(|i| CellUpload {
            id: Some(format!("seed-{:03}", i)),
            lat: args.lat + rng.random_range(-args.spread..args.spread),
            lon: args.lon + rng.random_range(-args.spread..args.spread),
            probability: rng.random_range(0.5..1.0),
            time_step: 1,
            predicted_at: Some(now),
        })
        .collect();

    println!(
        "Uploading {} cells around ({}, {})...",
        cells.len(),
        args.lat,
        args.lon
    );

    let client = reqwest::Client::new();
    let resp = client
        .put(format!("{}/v1/cells", args.url))
        .json(&cells)
        .send()
        .await?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;
    if !status.is_success() {
        anyhow::bail!("Server returned {}: {}", status, body);
    }

    println!("Active cells on server: {}", body["active_cells"]);
    Ok(())
}
