//! Enroll a finger into the template library
//!
//! Usage: `SENSOR_ADDR=192.168.1.50:2000 cargo run --example enroll -- 12`
//! (`SENSOR_ADDR` is the bridge as `host:port`)

use std::time::Duration;

use fpuart::{CharBuffer, Config, LedColor, LedMode, Sensor, Status};
use fpuart_transport::TcpTransport;
use tokio::time::sleep;

async fn capture(sensor: &mut Sensor, slot: CharBuffer) -> anyhow::Result<()> {
    println!("Place finger on sensor...");
    loop {
        match sensor.get_image().await? {
            Status::Ok => break,
            Status::NoFinger => sleep(Duration::from_millis(200)).await,
            status => anyhow::bail!("imaging failed: {}", status),
        }
    }

    let status = sensor.convert_image(slot).await?;
    anyhow::ensure!(status.is_ok(), "feature extraction failed: {}", status);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let addr = std::env::var("SENSOR_ADDR").unwrap_or_else(|_| "192.168.1.50:2000".to_string());
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("SENSOR_ADDR must be host:port"))?;

    let location: u16 = std::env::args().nth(1).unwrap_or_else(|| "0".into()).parse()?;

    let mut transport = TcpTransport::new(host, port.parse()?);
    transport.connect().await?;

    let mut sensor = Sensor::connect(transport, Config::default()).await?;
    sensor.set_led(LedColor::Blue, LedMode::Breathing, 0x80, 0).await?;

    capture(&mut sensor, CharBuffer::One).await?;

    println!("Remove finger");
    while sensor.get_image().await? != Status::NoFinger {
        sleep(Duration::from_millis(200)).await;
    }

    capture(&mut sensor, CharBuffer::Two).await?;

    let status = sensor.create_model().await?;
    anyhow::ensure!(status.is_ok(), "fingers did not match: {}", status);

    let status = sensor.store_model(location, CharBuffer::One).await?;
    anyhow::ensure!(status.is_ok(), "store failed: {}", status);

    println!("Stored template at #{}", location);

    sensor.set_led(LedColor::Blue, LedMode::Off, 0, 0).await?;
    sensor.close().await?;

    Ok(())
}
