//! Simulation Module
//!
//! Runs the drafting pack-race simulation: one controlled car against a
//! recycled AI field on a multi-lane oval, expressed entirely in the
//! controlled car's reference frame. The session facade hands a state
//! snapshot to the presentation layer once per frame.

pub mod collision;
pub mod config;
pub mod drafting;
pub mod lanes;
pub mod pack;
pub mod race;
pub mod roster;
pub mod session;
pub mod track;
pub mod vehicle;

pub use config::{Formation, TrackPreset, Tuning};
pub use lanes::LaneIntent;
pub use race::{FrameInput, Race, RacePhase, RaceSnapshot};
pub use roster::{DriverInfo, DriverRef};
pub use session::{GameState, Session, SessionStats, SharedSession};
pub use vehicle::{Car, CarSnapshot, CarState};
