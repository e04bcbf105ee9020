//! Type descriptor names supplied on the command line
//!
//! The runtime keeps its type descriptors in globals. We don't read symbol tables ourselves; the
//! user passes the addresses in, either as a JSON object or as `NAME=ADDR` pairs.

use std::collections::HashMap;
use std::num::ParseIntError;
use std::{fs, io, path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeTableError {
    #[error("cannot read type table {}: {source}", .path.display())]
    Io {
        path: path::PathBuf,
        source: io::Error,
    },
    #[error("invalid type table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid address `{text}`: {source}")]
    Address { text: String, source: ParseIntError },
    #[error("expected NAME=ADDR, found `{0}`")]
    Entry(String),
}

/// Parses a word given in hex with a `0x` prefix or in decimal
pub fn parse_word(text: &str) -> Result<u64, TypeTableError> {
    let text = text.trim();

    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };

    parsed.map_err(|source| TypeTableError::Address {
        text: text.to_owned(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonAddress {
    Int(u64),
    Text(String),
}

/// Maps type descriptor addresses to names
#[derive(Debug, Default, Clone)]
pub struct TypeTable {
    names: HashMap<u64, String>,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable::default()
    }

    /// Parses a JSON object mapping names to addresses
    pub fn from_json(source: &str) -> Result<TypeTable, TypeTableError> {
        let entries: HashMap<String, JsonAddress> = serde_json::from_str(source)?;

        let mut table = TypeTable::new();
        for (name, address) in entries {
            let address = match address {
                JsonAddress::Int(address) => address,
                JsonAddress::Text(text) => parse_word(&text)?,
            };

            table.insert(name, address);
        }

        Ok(table)
    }

    pub fn load(path: &path::Path) -> Result<TypeTable, TypeTableError> {
        let source = fs::read_to_string(path).map_err(|source| TypeTableError::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::from_json(&source)
    }

    pub fn insert(&mut self, name: impl Into<String>, address: u64) {
        self.names.insert(address, name.into());
    }

    /// Adds an entry in `NAME=ADDR` form
    pub fn add_entry(&mut self, entry: &str) -> Result<(), TypeTableError> {
        let (name, address) = match entry.split_once('=') {
            Some((name, address)) if !name.trim().is_empty() => (name.trim(), address),
            _ => return Err(TypeTableError::Entry(entry.to_owned())),
        };

        self.insert(name, parse_word(address)?);
        Ok(())
    }

    pub fn name_of(&self, address: u64) -> Option<&str> {
        self.names.get(&address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
