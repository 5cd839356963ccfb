//! # fpuart
//!
//! Driver for UART optical fingerprint sensors (R30x/R50x/AS608 and
//! compatibles).
//!
//! ## Features
//!
//! - Typed packet protocol with checksum verification
//! - Async/await API using Tokio
//! - Chunked image and template upload/download
//! - Vendor status codes passed through as values, never as errors
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fpuart::{CharBuffer, Config, Sensor, Status};
//! use fpuart_transport::TcpTransport;
//!
//! #[tokio::main]
//! async fn main() -> fpuart::Result<()> {
//!     // Sensor behind a serial-over-TCP bridge
//!     let mut transport = TcpTransport::new("192.168.1.50", 2000);
//!     transport.connect().await?;
//!
//!     let mut sensor = Sensor::connect(transport, Config::default()).await?;
//!
//!     while sensor.get_image().await? != Status::Ok {
//!         tokio::time::sleep(Duration::from_millis(200)).await;
//!     }
//!     sensor.convert_image(CharBuffer::One).await?;
//!
//!     if let Some(found) = sensor.fast_search().await?.value {
//!         println!("Matched {}", found);
//!     }
//!
//!     sensor.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod reply;
pub mod sensor;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use reply::Reply;
pub use sensor::Sensor;

// Re-export types
pub use fpuart_core::{Address, Command, Packet, Session, SessionState, Status};
pub use fpuart_types::{
    BufferKind, CharBuffer, LedColor, LedMode, MatchResult, PacketSize, SystemParameter,
    SystemParameters, TemplateIndex,
};
