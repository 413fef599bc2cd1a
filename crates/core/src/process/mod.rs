//! Process notifications and commands.
//!
//! States flow out to a supervising process through a `ProcessMessageSink`;
//! commands flow in and are dispatched by `ProcessCommandHandler`.

mod commands;
mod process_state;
mod sink;

pub use commands::*;
pub use process_state::*;
pub use sink::*;
