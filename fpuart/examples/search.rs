//! Identify a finger against the library
//!
//! Usage: `SENSOR_ADDR=192.168.1.50:2000 cargo run --example search`
//! (`SENSOR_ADDR` is the bridge as `host:port`)

use std::time::Duration;

use fpuart::{BufferKind, CharBuffer, Config, MatchResult, Reply, Sensor, Status};
use fpuart_transport::TcpTransport;
use tokio::time::sleep;

/// Search once more after a resync if the link dropped out of step
async fn search(sensor: &mut Sensor) -> fpuart::Result<Reply<MatchResult>> {
    match sensor.fast_search().await {
        Err(e) if e.is_recoverable() => {
            eprintln!("Search failed ({}), resyncing", e);
            sensor.resync().await?;
            sensor.fast_search().await
        }
        result => result,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = std::env::var("SENSOR_ADDR").unwrap_or_else(|_| "192.168.1.50:2000".to_string());
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("SENSOR_ADDR must be host:port"))?;

    let mut transport = TcpTransport::new(host, port.parse()?);
    transport.connect().await?;

    let mut sensor = Sensor::connect(transport, Config::default()).await?;

    if let Some(params) = sensor.parameters() {
        println!("{}", params);
    }

    let index = sensor.read_template_index().await?;
    match index.value {
        Some(index) => println!("{} templates stored: {:?}", index.len(), index.iter().collect::<Vec<_>>()),
        None => println!("Could not read template index: {}", index.status),
    }

    println!("Place finger on sensor...");
    while sensor.get_image().await? != Status::Ok {
        sleep(Duration::from_millis(200)).await;
    }
    sensor.convert_image(CharBuffer::One).await?;

    let reply = search(&mut sensor).await?;
    match reply.value {
        Some(found) => println!("Matched {}", found),
        None => println!("No match: {}", reply.status),
    }

    let features = sensor.upload(BufferKind::Character, CharBuffer::One).await?;
    if let Some(data) = features.value {
        println!("Feature file ({} bytes): {}...", data.len(), hex::encode(&data[..data.len().min(16)]));
    }

    sensor.close().await?;

    Ok(())
}
