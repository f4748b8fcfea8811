//! Pack Racer - Drafting race simulation engine
//!
//! Per-frame simulation of a controlled car inside a large AI pack:
//! slipstream and bumper drafting, lane-change arbitration, collision
//! classification with per-car crash states, and a rolling-start race
//! controller. Asset loading, rendering, menus and the event loop are
//! the host's business; the engine consumes per-frame input and static
//! track/roster data and emits a snapshot for presentation.

pub mod sim;

pub use sim::{
    Car, CarSnapshot, CarState, DriverInfo, DriverRef, Formation, FrameInput, GameState,
    LaneIntent, Race, RacePhase, RaceSnapshot, Session, SessionStats, SharedSession, TrackPreset,
    Tuning,
};
