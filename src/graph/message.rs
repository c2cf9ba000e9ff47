use std::fmt;

use rtrb::Producer;

use super::source::{BufferSource, ClickSource};
use crate::voices::Voice;

/// Control → render messages. Everything time-based carries its start on
/// the audio clock; the render side never looks at wall time.
pub enum GraphCommand {
    Play(BufferSource),
    Click(ClickSource),
    /// Duck `voice` to the choke floor from `at`, then restore its mixer level.
    Choke { voice: Voice, at: f64 },
    SetVoiceLevel { voice: Voice, level: f32 },
    SetMasterLevel { level: f32 },
    ConnectTap(Producer<f32>),
    DisconnectTap,
}

impl fmt::Debug for GraphCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphCommand::Play(source) => f
                .debug_struct("Play")
                .field("voice", &source.voice())
                .field("velocity", &source.velocity())
                .finish(),
            GraphCommand::Click(_) => f.write_str("Click"),
            GraphCommand::Choke { voice, at } => f
                .debug_struct("Choke")
                .field("voice", voice)
                .field("at", at)
                .finish(),
            GraphCommand::SetVoiceLevel { voice, level } => f
                .debug_struct("SetVoiceLevel")
                .field("voice", voice)
                .field("level", level)
                .finish(),
            GraphCommand::SetMasterLevel { level } => {
                f.debug_struct("SetMasterLevel").field("level", level).finish()
            }
            GraphCommand::ConnectTap(_) => f.write_str("ConnectTap"),
            GraphCommand::DisconnectTap => f.write_str("DisconnectTap"),
        }
    }
}
