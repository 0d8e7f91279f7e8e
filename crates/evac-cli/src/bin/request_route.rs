//! CLI tool to request a fire-aware walking route from the Evac server.

use clap::Parser;

/// Request a safe walking route between two points
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Evac Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Start latitude
    #[arg(long, default_value_t = 37.4979)]
    start_lat: f64,

    /// Start longitude
    #[arg(long, default_value_t = 127.0276)]
    start_lon: f64,

    /// End latitude
    #[arg(long, default_value_t = 37.5045)]
    end_lat: f64,

    /// End longitude
    #[arg(long, default_value_t = 127.0490)]
    end_lon: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!(
        "Requesting route ({}, {}) -> ({}, {}) via {}...",
        args.start_lat, args.start_lon, args.end_lat, args.end_lon, args.url
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/v1/routes/safe", args.url))
        .json(&serde_json::json!({
            "start_lat": args.start_lat,
            "start_lon": args.start_lon,
            "end_lat": args.end_lat,
            "end_lon": args.end_lon,
        }))
        .send()
        .await?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;
    if !status.is_success() {
        anyhow::bail!("Server returned {}: {}", status, body);
    }

    let distance_m = body["total_distance_m"].as_f64().unwrap_or(0.0);
    let points = body["path"].as_array().map(|p| p.len()).unwrap_or(0);

    println!("Verdict:  {}", body["verdict"].as_str().unwrap_or("unknown"));
    println!("Distance: {:.2} km", distance_m / 1000.0);
    println!("Time:     {} min", body["total_time_min"]);
    println!("Points:   {}", points);
    println!("Attempts: {}", body["attempts"]);
    if let Some(message) = body["message"].as_str() {
        println!("Note:     {}", message);
    }

    Ok(())
}
