//! Interactive 3x3x3 cube engine.
//!
//! Builds a cube of pieces, turns layers by user-relative face labels,
//! reorients the whole cube with a smoothed integrator, records moves and
//! replays them in reverse. Everything advances through
//! [`CubeSession::tick`], so the engine runs headless as well as behind the
//! viewport in the binary.

pub mod camera;
pub mod config;
pub mod coords;
pub mod cube;
pub mod error;
pub mod integrator;
pub mod layer;
pub mod math;
pub mod moves;
pub mod orientation;
pub mod pick;
pub mod scene;
pub mod session;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use layer::Level;
pub use moves::{Direction, Move, MoveLog};
pub use orientation::{LogicalFace, Orientation};
pub use session::{Completion, CubeSession, Outcome};
