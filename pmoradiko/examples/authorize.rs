//! Example: Run the radiko authorization handshake
//!
//! Run with: cargo run -p pmoradiko --example authorize

use pmoradiko::{RadikoClient, RequestContext};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // 1. Create a client without token
    let mut client = RadikoClient::new("")?;

    // 2. Authorize: the client keeps the token for authenticated requests
    let ctx = RequestContext::with_timeout(Duration::from_secs(30));
    let auth_token = client.authorize_token(&ctx).await?;

    println!("Auth token: {}", auth_token);
    println!("Area: {}", client.area_id(&ctx).await?);

    Ok(())
}
