//! The wire-agnostic message envelope and the codec trait used to move it
//! on and off the wire (§3, §4.1).

mod codec;
mod types;

pub use codec::{Codec, CodecError, CodecOp, JsonCodec, Wire, WireFormat};
pub use types::{Interaction, InteractionDirection, Message};
