#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use site_evm::{ProjectSession, http_api};

    env_logger::init();

    let addr: SocketAddr = std::env::var("SITE_SCHEDULE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    println!("site-schedule HTTP API listening on http://{addr}");
    http_api::serve(addr, ProjectSession::default()).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
