//! A steppable interpreter for a small turtle drawing language, with planar
//! and spatial turtle kinematics.
//!
//! ```text
//! set n 4
//! pendown
//! repeat n [
//!   forward 10
//!   right 90
//! ]
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod session;
pub mod turtle;

pub use config::{Config, Mode};
pub use error::{Error, Result};
pub use parser::{load_str, Command, Operand, Program};
pub use runtime::{Interpreter, State, StepOutcome};
pub use session::Session;
pub use turtle::{DVec2, DVec3, Path, PathEntry, PlanarTurtle, SpatialTurtle, Turtle};
