use std::collections::BTreeMap;
use std::io;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Proof carried by the genesis block
pub const GENESIS_PROOF: i64 = 100;

/// `previous_hash` of the genesis block.
///
/// `=` is not a hex digit, so this can never collide with a real block hash.
pub const GENESIS_PREVIOUS_HASH: &str = "===============";

/// Represents a block in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// 1-based position of the block in the chain
    pub index: u64,

    /// Creation time in seconds since the Unix epoch
    pub timestamp: f64,

    /// Transactions included in this block, in submission order
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<Value>,

    /// Proof of work submitted by the miner
    pub proof: i64,

    /// Hash of the previous block
    pub previous_hash: String,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The 1-based index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `proof` - The proof of work
    /// * `previous_hash` - The hash of the previous block
    pub fn new(index: u64, transactions: Vec<Value>, proof: i64, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: unix_timestamp(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Creates the genesis block
    pub fn genesis() -> Self {
        Block::new(1, Vec::new(), GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Returns the canonical string of the block.
    ///
    /// Fields are written as a JSON object with keys sorted by name at every
    /// level, using `", "` and `": "` as separators. This is the same text a
    /// `json.dumps(block, sort_keys=True)` style dump of the block payload
    /// produces, so external miners can reproduce it from `/last_block`.
    pub fn canonical_string(&self) -> String {
        let mut fields = BTreeMap::new();
        fields.insert("index", Value::from(self.index));
        fields.insert("previous_hash", Value::from(self.previous_hash.as_str()));
        fields.insert("proof", Value::from(self.proof));
        fields.insert("timestamp", Value::from(self.timestamp));
        fields.insert(
            "transactions",
            Value::Array(self.transactions.iter().map(sort_keys).collect()),
        );

        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
        fields
            .serialize(&mut serializer)
            .expect("serializing JSON values into memory cannot fail");

        String::from_utf8(buf).expect("serde_json always emits UTF-8")
    }
}

/// Current time as fractional seconds since the Unix epoch
fn unix_timestamp() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Rebuilds a JSON value with every object's keys in sorted order
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(key, value)| (key, sort_keys(value))).collect();

            let mut out = Map::new();
            for (key, value) in sorted {
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with a space after every `,` and `:`
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
