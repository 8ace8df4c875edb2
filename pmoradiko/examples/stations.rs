//! Example: List radiko stations and what they are airing
//!
//! Run with: cargo run -p pmoradiko --example stations
//! Or for a given area: cargo run -p pmoradiko --example stations -- JP27

use pmoradiko::{RadikoClient, RequestContext};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let client = RadikoClient::new("")?;
    let ctx = RequestContext::with_timeout(Duration::from_secs(30));

    // Get area from command line or from the caller's IP address
    let area = match env::args().nth(1) {
        Some(area) => area,
        None => client.area_id(&ctx).await?,
    };

    let stations = client.get_stations(&ctx, &area).await?;
    let now = client.get_now_programs(&ctx, &area).await?;

    println!("{} ({}): {} stations\n", stations.area_name, area, stations.stations.len());

    for station in &stations.stations {
        println!("{} ({})", station.name, station.id);

        if let Some(program) = now
            .station(&station.id)
            .and_then(|schedule| schedule.programs().next())
        {
            println!("  Now: {} [{}-{}]", program.title, program.ftl, program.tol);
            if !program.pfm.is_empty() {
                println!("  With: {}", program.pfm);
            }
        }
    }

    Ok(())
}
