pub mod reading;

pub use reading::{RawReading, Reading, Status};
