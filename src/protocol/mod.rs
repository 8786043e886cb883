//! Protocol Module
//!
//! Defines the wire protocol for client-server communication and the
//! line-oriented shell syntax that maps onto the same commands.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET     - Payload: db, key
//! - 0x02: SET     - Payload: db, key, value
//! - 0x03: DEL     - Payload: db, key
//! - 0x04: PING    - Payload: empty
//! - 0x05: OPEN    - Payload: db
//! - 0x06: CLOSE   - Payload: db
//! - 0x07: COMPACT - Payload: db
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR

mod codec;
mod command;
mod response;
pub mod shell;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use command::{Command, CommandType};
pub use response::{Response, Status};
