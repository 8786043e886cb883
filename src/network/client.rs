//! TCP Client
//!
//! Blocking client speaking the binary protocol, one request at a time.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{HashLogError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// Connection to a hashlog server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| HashLogError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one command and wait for its response
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn open(&mut self, db: &str) -> Result<()> {
        let response = self.execute(&Command::Open { db: db.to_string() })?;
        expect_ok(response).map(|_| ())
    }

    pub fn close(&mut self, db: &str) -> Result<()> {
        let response = self.execute(&Command::Close { db: db.to_string() })?;
        expect_ok(response).map(|_| ())
    }

    /// `Ok(None)` when the key does not exist
    pub fn get(&mut self, db: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let response = self.execute(&Command::Get {
            db: db.to_string(),
            key: key.to_vec(),
        })?;
        if response.status == Status::NotFound {
            return Ok(None);
        }
        expect_ok(response).map(|payload| Some(payload.unwrap_or_default()))
    }

    pub fn set(&mut self, db: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let response = self.execute(&Command::Set {
            db: db.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        expect_ok(response).map(|_| ())
    }

    pub fn delete(&mut self, db: &str, key: &[u8]) -> Result<()> {
        let response = self.execute(&Command::Delete {
            db: db.to_string(),
            key: key.to_vec(),
        })?;
        expect_ok(response).map(|_| ())
    }

    /// Returns the server's compaction summary
    pub fn compact(&mut self, db: &str) -> Result<String> {
        let response = self.execute(&Command::Compact { db: db.to_string() })?;
        let payload = expect_ok(response)?;
        Ok(String::from_utf8_lossy(&payload.unwrap_or_default()).into_owned())
    }

    pub fn ping(&mut self) -> Result<()> {
        let response = self.execute(&Command::Ping)?;
        expect_ok(response).map(|_| ())
    }
}

fn expect_ok(response: Response) -> Result<Option<Vec<u8>>> {
    match response.status {
        Status::Ok => Ok(response.payload),
        Status::NotFound => Err(HashLogError::KeyNotFound),
        Status::Error => Err(HashLogError::Network(response.payload_text())),
    }
}
