//! Remote Subscriber Protocol
//!
//! The compact, correlation-id-based request/response protocol spoken with
//! remote subscriber processes. Messages carry an explicit `kind` type tag;
//! the codec round-trips logical content and fills well-defined defaults
//! for absent optional fields.

mod codec;
mod messages;

pub use codec::{CodecError, decode, encode};
pub use messages::{NO_CORRELATION, ProtocolMessage, ResultCode};
