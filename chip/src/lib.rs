pub mod chip8;
pub mod config;
pub mod definitions;
pub mod devices;
pub mod opcode;
pub mod resources;
pub mod runner;
pub mod timer;
mod error;

// reexporting for convinience
pub use chip8::ChipSet;
pub use config::Config;
pub use error::*;
pub use runner::{run, Flow, Runner, Shutdown};
