//! FSD feed protocol: framing, line parsing, PBH decoding and login lines

pub mod framing;
pub mod geo;
pub mod login;
pub mod parser;
pub mod pbh;
mod types;

pub use framing::{FrameError, LineFramer};
pub use login::{Credentials, Login, LoginMode, LoginSequence, Presence};
pub use parser::parse_line;
pub use pbh::PackedAttitude;
pub use types::{DecodedAttitude, ParsedLine, PositionReport, WireFormat};
