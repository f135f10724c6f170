mod bus;
mod decode;
mod error;
mod replay;

pub use bus::{Handler, MemoryBus, Message, Publisher, SubscriptionId, Transport};
pub use decode::{decode_origin, decode_position, FieldDecoder, ValueKind};
pub use error::{DecodeError, ReplayError, TransportError};
pub use replay::{load_replay, replay, ReplayRecord};
