//! Dispatcher Module
//!
//! Validates requests and executes them against the Store.
//!
//! ## Responsibilities
//! - Normalize decoded requests into a command name plus arguments
//! - Route commands through a fixed name → handler table
//! - Turn every handler failure into `KvError::Command`

use std::collections::HashMap;

use crate::error::{KvError, Result};
use crate::protocol::{Command, Value};
use crate::store::{Key, Store};

/// Signature shared by every command handler
type Handler = fn(&Store, &[Value]) -> Result<Value>;

/// Built-in commands. Fixed at compile time; no runtime registration.
const COMMANDS: &[(&str, Handler)] = &[
    ("GET", get),
    ("SET", set),
    ("DELETE", delete),
    ("FLUSH", flush),
    ("MGET", mget),
    ("MSET", mset),
];

/// Routes requests to command handlers
///
/// ## Concurrency Model
///
/// `execute` takes `&self`, so one Dispatcher is shared by all connections
/// behind an `Arc`. Each handler performs exactly one Store operation, and
/// every Store operation holds the Store lock for its whole duration, so each
/// command is atomic with respect to every other command.
pub struct Dispatcher {
    /// The key-value data, owned for the Dispatcher's lifetime
    store: Store,

    /// Name → handler lookup built from `COMMANDS`
    commands: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    /// Create a dispatcher over a fresh, empty store
    pub fn new() -> Self {
        Self::with_store(Store::new())
    }

    /// Create a dispatcher over an existing store
    pub fn with_store(store: Store) -> Self {
        Self {
            store,
            commands: COMMANDS.iter().copied().collect(),
        }
    }

    /// Execute one decoded request
    ///
    /// Every failure is a `KvError::Command` carrying the message the client
    /// should see.
    pub fn execute(&self, request: Value) -> Result<Value> {
        let command = Command::from_value(request)?;

        let handler = self.commands.get(command.name.as_str()).ok_or_else(|| {
            KvError::Command(format!("unrecognized command: {}", command.name))
        })?;

        tracing::debug!(
            command = %command.name,
            args = command.args.len(),
            "{} request received",
            command.name
        );

        handler(&self.store, &command.args)
    }

    /// Names of all built-in commands
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> {
        COMMANDS.iter().map(|(name, _)| *name)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// GET key
fn get(store: &Store, args: &[Value]) -> Result<Value> {
    expect_args("GET", args, 1)?;
    let key = key_of(&args[0])?;
    Ok(store.get(&key).unwrap_or(Value::Null))
}

/// SET key value
fn set(store: &Store, args: &[Value]) -> Result<Value> {
    expect_args("SET", args, 2)?;
    let key = key_of(&args[0])?;
    store.set(key, args[1].clone());
    Ok(Value::Integer(1))
}

/// DELETE key
fn delete(store: &Store, args: &[Value]) -> Result<Value> {
    expect_args("DELETE", args, 1)?;
    let key = key_of(&args[0])?;
    Ok(Value::Integer(if store.delete(&key) { 1 } else { 0 }))
}

/// FLUSH
fn flush(store: &Store, args: &[Value]) -> Result<Value> {
    expect_args("FLUSH", args, 0)?;
    Ok(Value::count(store.clear()))
}

/// MGET key [key ...]
fn mget(store: &Store, args: &[Value]) -> Result<Value> {
    let keys = args.iter().map(key_of).collect::<Result<Vec<_>>>()?;
    let values = store
        .get_many(&keys)
        .into_iter()
        .map(|v| v.unwrap_or(Value::Null))
        .collect();
    Ok(Value::Array(values))
}

/// MSET key value [key value ...]
fn mset(store: &Store, args: &[Value]) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(KvError::command(
            "MSET requires an even number of arguments",
        ));
    }
    let pairs = args
        .chunks_exact(2)
        .map(|pair| Ok((key_of(&pair[0])?, pair[1].clone())))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::count(store.set_many(pairs)))
}

// =============================================================================
// Argument Helpers
// =============================================================================

fn expect_args(name: &str, args: &[Value], count: usize) -> Result<()> {
    if args.len() != count {
        return Err(KvError::Command(format!(
            "wrong number of arguments for '{}' command",
            name
        )));
    }
    Ok(())
}

/// Keys may be given as bulk strings, simple strings or integers
fn key_of(value: &Value) -> Result<Key> {
    match value {
        // Keys live in one byte-string namespace: `:5` and `$1\r\n5` name the same key
        Value::Integer(n) => Ok(n.to_string().into_bytes()),
        other => other
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| KvError::Command(format!("invalid key: {}", other.kind()))),
    }
}
