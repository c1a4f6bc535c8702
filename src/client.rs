//! Blocking client
//!
//! Sends commands as arrays of bulk strings and decodes the replies.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::protocol::{read_value, write_value, Value};

/// A connection to an EmberKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a raw command and wait for the reply
    ///
    /// An error reply is returned as `KvError::Server`.
    pub fn execute<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<Value> {
        let request = Value::Array(
            args.iter()
                .map(|arg| Value::bulk(Bytes::copy_from_slice(arg.as_ref())))
                .collect(),
        );
        write_value(&mut self.writer, &request)?;

        match read_value(&mut self.reader) {
            Ok(Value::Error(message)) => Err(KvError::Server(message)),
            Ok(value) => Ok(value),
            Err(KvError::Disconnect) => Err(KvError::protocol("server closed the connection")),
            Err(e) => Err(e),
        }
    }

    /// GET key. Returns `Value::Null` for a missing key.
    pub fn get(&mut self, key: &[u8]) -> Result<Value> {
        self.execute(&[b"GET".as_slice(), key])
    }

    /// SET key value
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.execute_integer(&[b"SET".as_slice(), key, value])?;
        Ok(())
    }

    /// DELETE key. Returns whether the key existed.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.execute_integer(&[b"DELETE".as_slice(), key])? == 1)
    }

    /// FLUSH. Returns the number of keys removed.
    pub fn flush(&mut self) -> Result<i64> {
        self.execute_integer(&[b"FLUSH".as_slice()])
    }

    /// MGET key [key ...]
    pub fn mget(&mut self, keys: &[&[u8]]) -> Result<Vec<Value>> {
        let mut args: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
        args.push(b"MGET");
        args.extend_from_slice(keys);

        match self.execute(&args)? {
            Value::Array(items) => Ok(items),
            other => Err(unexpected("array", &other)),
        }
    }

    /// MSET key value [key value ...]. Returns the number of pairs stored.
    pub fn mset(&mut self, pairs: &[(&[u8], &[u8])]) -> Result<i64> {
        let mut args: Vec<&[u8]> = Vec::with_capacity(pairs.len() * 2 + 1);
        args.push(b"MSET");
        for &(key, value) in pairs {
            args.push(key);
            args.push(value);
        }
        self.execute_integer(&args)
    }

    fn execute_integer(&mut self, args: &[&[u8]]) -> Result<i64> {
        let reply = self.execute(args)?;
        reply.as_integer().ok_or_else(|| unexpected("integer", &reply))
    }
}

fn unexpected(expected: &str, got: &Value) -> KvError {
    KvError::Protocol(format!("expected {} reply, got {}", expected, got.kind()))
}
