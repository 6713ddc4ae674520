use sim::{SimBehavior, SimTcs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| "0.0.0.0:10100".to_string());
    let server = SimTcs::spawn(&addr, SimBehavior::default()).await?;
    println!("simulated PF400 TCS listening on {}", server.addr);

    tokio::signal::ctrl_c().await?;
    Ok(())
}
