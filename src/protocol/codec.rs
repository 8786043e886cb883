//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! Payloads are a sequence of fields, each `field_len (4 bytes) + bytes`:
//! - OPEN / CLOSE / COMPACT: db
//! - GET / DELETE:           db, key
//! - SET:                    db, key, value
//! - PING:                   empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Command, CommandType, Response, Status};
use crate::error::{HashLogError, Result};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        Command::Open { db } | Command::Close { db } | Command::Compact { db } => {
            put_field(&mut payload, db.as_bytes());
        }
        Command::Get { db, key } | Command::Delete { db, key } => {
            put_field(&mut payload, db.as_bytes());
            put_field(&mut payload, key);
        }
        Command::Set { db, key, value } => {
            put_field(&mut payload, db.as_bytes());
            put_field(&mut payload, key);
            put_field(&mut payload, value);
        }
        Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, mut payload) = split_frame(bytes, "command")?;

    let command_type = CommandType::from_u8(cmd_type).ok_or_else(|| {
        HashLogError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_type))
    })?;
    let name = format!("{:?}", command_type).to_uppercase();

    let command = match command_type {
        CommandType::Open => Command::Open {
            db: take_db(&mut payload, &name)?,
        },
        CommandType::Close => Command::Close {
            db: take_db(&mut payload, &name)?,
        },
        CommandType::Compact => Command::Compact {
            db: take_db(&mut payload, &name)?,
        },
        CommandType::Get => Command::Get {
            db: take_db(&mut payload, &name)?,
            key: take_field(&mut payload, &name, "key")?,
        },
        CommandType::Delete => Command::Delete {
            db: take_db(&mut payload, &name)?,
            key: take_field(&mut payload, &name, "key")?,
        },
        CommandType::Set => Command::Set {
            db: take_db(&mut payload, &name)?,
            key: take_field(&mut payload, &name, "key")?,
            value: take_field(&mut payload, &name, "value")?,
        },
        CommandType::Ping => Command::Ping,
    };

    if payload.has_remaining() {
        return Err(HashLogError::Protocol(format!(
            "{} command: unexpected trailing {} bytes",
            name,
            payload.remaining()
        )));
    }

    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(HashLogError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Validate header and length; returns the kind byte and exact payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(HashLogError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = header.get_u32() as usize;
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(HashLogError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

/// Read one header + payload from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut message = vec![0u8; HEADER_SIZE];
    reader.read_exact(&mut message)?;

    let payload_len = u32::from_be_bytes([message[1], message[2], message[3], message[4]]) as usize;
    check_payload_len(payload_len, "message")?;

    message.resize(HEADER_SIZE + payload_len, 0);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

fn check_payload_len(payload_len: usize, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(HashLogError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

fn put_field(buf: &mut BytesMut, field: &[u8]) {
    buf.put_u32(field.len() as u32);
    buf.put_slice(field);
}

fn take_field(payload: &mut &[u8], command: &str, field: &str) -> Result<Vec<u8>> {
    if payload.remaining() < 4 {
        return Err(HashLogError::Protocol(format!(
            "{} command: missing {} length",
            command, field
        )));
    }
    let len = payload.get_u32() as usize;

    if payload.remaining() < len {
        return Err(HashLogError::Protocol(format!(
            "{} command: incomplete {} (expected {}, got {})",
            command,
            field,
            len,
            payload.remaining()
        )));
    }

    let bytes = payload[..len].to_vec();
    payload.advance(len);
    Ok(bytes)
}

fn take_db(payload: &mut &[u8], command: &str) -> Result<String> {
    let raw = take_field(payload, command, "db")?;
    String::from_utf8(raw).map_err(|_| {
        HashLogError::Protocol(format!("{} command: db name is not UTF-8", command))
    })
}
