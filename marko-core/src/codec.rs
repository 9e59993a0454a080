//! Model interchange format.
//!
//! A trained chain is persisted as JSON:
//!
//! ```json
//! {"order":1,"frequencies":{"[null]":{"\"a\"":2},"[\"a\"]":{"\"a\"":1,"null":1}}}
//! ```
//!
//! - `order`: the order of the chain.
//! - `frequencies`: one entry per context. The key is the JSON text of an
//!   array holding one value per context slot, START being `null`. The value
//!   maps the JSON text of each next token to its count, END being `null`.
//!
//! Unknown top-level fields are ignored. Entries are written, and read back,
//! in the chain's enumeration order so a decoded chain samples exactly like
//! the one that was encoded.
//!
//! [`Format::Binary`] stores the same content as a compact `postcard`
//! snapshot.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{malformed, ChainError, Result};
use crate::model::{ChainModel, Symbol};

/// Text of a sentinel in context and transition keys.
const SENTINEL: &str = "null";

/// Serialized representation of a chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
	/// Self-describing JSON document.
	#[default]
	Json,
	/// Compact `postcard` snapshot.
	Binary,
}

impl Format {
	pub fn encode<T>(self, model: &ChainModel<T>) -> Result<Vec<u8>>
	where
		T: Serialize + Eq + Hash,
	{
		match self {
			Format::Json => encode(model),
			Format::Binary => encode_binary(model),
		}
	}

	pub fn decode<T>(self, bytes: &[u8]) -> Result<ChainModel<T>>
	where
		T: DeserializeOwned + Eq + Hash + Clone,
	{
		match self {
			Format::Json => decode(bytes),
			Format::Binary => decode_binary(bytes),
		}
	}
}

impl fmt::Display for Format {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Format::Json => f.write_str("json"),
			Format::Binary => f.write_str("binary"),
		}
	}
}

impl FromStr for Format {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"json" => Ok(Format::Json),
			"binary" | "bin" => Ok(Format::Binary),
			other => Err(format!("unknown model format '{}', expected 'json' or 'binary'", other)),
		}
	}
}

#[derive(Serialize)]
struct Document {
	order: usize,
	frequencies: Map<String, Value>,
}

/// Only the required fields; anything else in the document is ignored.
#[derive(Deserialize)]
struct RawDocument {
	order: Value,
	frequencies: Entries<Entries<Value>>,
}

/// A JSON object read as its entries, in document order.
///
/// A key appearing twice is an error.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		deserializer.deserialize_map(EntriesVisitor(PhantomData))
	}
}

struct EntriesVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
	type Value = Entries<V>;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("an object")
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
		let mut seen = HashSet::new();
		let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
		while let Some(key) = map.next_key::<String>()? {
			if !seen.insert(key.clone()) {
				return Err(de::Error::custom(format!("duplicate key {}", key)));
			}
			let value = map.next_value()?;
			entries.push((key, value));
		}
		Ok(Entries(entries))
	}
}

/// Encodes `model` as a JSON document.
///
/// # Errors
/// Returns [`ChainError::Serialization`] if a token cannot be serialized or
/// serializes to `null`, which is reserved for the sentinels.
pub fn encode<T>(model: &ChainModel<T>) -> Result<Vec<u8>>
where
	T: Serialize + Eq + Hash,
{
	let mut frequencies = Map::new();
	for (context, transitions) in model.contexts() {
		let mut row = Map::new();
		for (next, count) in transitions.iter() {
			row.insert(symbol_text(next)?, Value::from(count));
		}

		let slots = context.iter().map(symbol_text).collect::<Result<Vec<_>>>()?;
		frequencies.insert(format!("[{}]", slots.join(",")), Value::Object(row));
	}

	let document = Document { order: model.order(), frequencies };
	serde_json::to_vec(&document).map_err(|e| ChainError::Serialization(e.to_string()))
}

/// Decodes a JSON document into a chain.
///
/// # Errors
/// Returns [`ChainError::MalformedModel`] if the document is not valid JSON,
/// misses `order` or `frequencies`, has an order that is not an integer >= 1,
/// a context or transition key that does not parse or appears twice, a
/// context whose length differs from the order, a count that is not a
/// non-negative integer, a context without any occurrence, or counts whose
/// sum overflows a `u64`.
pub fn decode<T>(bytes: &[u8]) -> Result<ChainModel<T>>
where
	T: DeserializeOwned + Eq + Hash + Clone,
{
	let document: RawDocument = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;

	let order = parse_order(&document.order)?;

	let mut model = ChainModel::new(order)?;
	for (key, Entries(row)) in document.frequencies.0 {
		let context = parse_context(&key)?;

		let mut transitions = Vec::with_capacity(row.len());
		for (next, count) in row {
			let Some(count) = count.as_u64() else {
				return Err(malformed(format!(
					"count of {} after {} must be a non-negative integer, got {}",
					next, key, count
				)));
			};
			transitions.push((parse_next(&next)?, count));
		}

		model.insert_state(context, transitions)?;
	}

	Ok(model)
}

fn symbol_text<T: Serialize>(symbol: &Symbol<T>) -> Result<String> {
	let Some(token) = symbol.token() else {
		return Ok(SENTINEL.to_owned());
	};
	let text = serde_json::to_string(token).map_err(|e| ChainError::Serialization(e.to_string()))?;
	if text == SENTINEL {
		return Err(ChainError::Serialization("token serializes to null, which is reserved for sentinels".to_owned()));
	}
	Ok(text)
}

fn parse_order(order: &Value) -> Result<usize> {
	let order = match order {
		Value::Number(number) => number
			.as_u64()
			.and_then(|order| usize::try_from(order).ok())
			.ok_or_else(|| malformed(format!("order must be a non-negative integer, got {}", number)))?,
		other => return Err(malformed(format!("order must be a number, got {}", other))),
	};
	if order < 1 {
		return Err(malformed("order must be >= 1"));
	}
	Ok(order)
}

fn parse_context<T: DeserializeOwned>(key: &str) -> Result<Vec<Symbol<T>>> {
	let slots: Vec<Option<T>> =
		serde_json::from_str(key).map_err(|e| malformed(format!("invalid context key {}: {}", key, e)))?;
	Ok(slots
		.into_iter()
		.map(|slot| slot.map_or(Symbol::Start, Symbol::Token))
		.collect())
}

fn parse_next<T: DeserializeOwned>(key: &str) -> Result<Symbol<T>> {
	if key.trim() == SENTINEL {
		return Ok(Symbol::End);
	}
	serde_json::from_str(key)
		.map(Symbol::Token)
		.map_err(|e| malformed(format!("invalid transition key {}: {}", key, e)))
}

#[derive(Serialize)]
struct SnapshotRef<'a, T> {
	order: u64,
	states: Vec<(&'a [Symbol<T>], Vec<(&'a Symbol<T>, u64)>)>,
}

#[derive(Deserialize)]
struct Snapshot<T> {
	order: u64,
	states: Vec<(Vec<Symbol<T>>, Vec<(Symbol<T>, u64)>)>,
}

/// Encodes `model` as a `postcard` snapshot.
pub fn encode_binary<T>(model: &ChainModel<T>) -> Result<Vec<u8>>
where
	T: Serialize + Eq + Hash,
{
	let snapshot = SnapshotRef {
		order: model.order() as u64,
		states: model
			.contexts()
			.map(|(context, transitions)| (context, transitions.iter().collect()))
			.collect(),
	};
	postcard::to_stdvec(&snapshot).map_err(|e| ChainError::Serialization(e.to_string()))
}

/// Decodes a `postcard` snapshot, with the same validation as [`decode`].
pub fn decode_binary<T>(bytes: &[u8]) -> Result<ChainModel<T>>
where
	T: DeserializeOwned + Eq + Hash + Clone,
{
	let snapshot: Snapshot<T> = postcard::from_bytes(bytes).map_err(|e| malformed(e.to_string()))?;
	let order = usize::try_from(snapshot.order)
		.ok()
		.filter(|&order| order >= 1)
		.ok_or_else(|| malformed(format!("order must be >= 1, got {}", snapshot.order)))?;

	let mut model = ChainModel::new(order)?;
	for (context, transitions) in snapshot.states {
		model.insert_state(context, transitions)?;
	}
	Ok(model)
}
