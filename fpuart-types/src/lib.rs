//! Type definitions for fpuart
//!
//! Typed views over the values the sensor reports or accepts: system
//! parameters, template library occupancy, match results and the closed
//! selectors used by bulk transfers and the LED ring.

pub mod buffer;
pub mod error;
pub mod led;
pub mod params;
pub mod template;

pub use buffer::{BufferKind, CharBuffer};
pub use error::{Error, Result};
pub use led::{LedColor, LedMode};
pub use params::{PacketSize, StatusRegister, SystemParameter, SystemParameters};
pub use template::{MatchResult, TemplateIndex};
