//! Configuration models for booking policy, retention and storage access.

pub mod engine;

pub use engine::{
    BookingConfig, ClinicConfig, EngineConfig, ExecutorConfig, RetentionConfig, SweepConfig,
};
