//! CLI commands module.

mod decode;
mod encode;
mod info;
mod util;

pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use info::InfoCommand;

pub(crate) use util::*;
