pub mod calendar;
pub mod clock;
pub mod telemetry;

pub use calendar::*;
pub use clock::*;
pub use telemetry::*;
