pub mod config;
pub mod dsp;
pub mod engine; // Trigger engine, metronome and the session facade
pub mod error;
pub mod graph; // Routing topology and the render side
pub mod recorder;
pub mod settings;
pub mod voices; // Procedural drum synthesis

pub use config::EngineConfig;
pub use engine::{ControlEvent, Engine};
pub use error::EngineError;
pub use voices::{synthesize, synthesize_kit, Kit, KitFlavor, Voice};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const APP_NAME: &str = "drumpad";
