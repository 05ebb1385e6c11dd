// Wire types for the Loop daemon REST gateway.
//
// The gateway renders proto3 messages as JSON: 64-bit integers arrive as
// strings, enums arrive as their symbolic names, and default values are
// omitted entirely. Everything here is decoded leniently so that newer
// daemons with extra enum values still parse.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Symbolic names of `looprpc.SwapState`.
pub const SWAP_STATE_NAMES: &[(&str, i32)] = &[
    ("INITIATED", 0),
    ("PREIMAGE_REVEALED", 1),
    ("HTLC_PUBLISHED", 2),
    ("SUCCESS", 3),
    ("FAILED", 4),
    ("INVOICE_SETTLED", 5),
];

/// Symbolic names of `looprpc.SwapType`.
pub const SWAP_TYPE_NAMES: &[(&str, i32)] = &[("LOOP_OUT", 0), ("LOOP_IN", 1)];

/// Symbolic names of `looprpc.FailureReason`.
pub const FAILURE_REASON_NAMES: &[(&str, i32)] = &[
    ("FAILURE_REASON_NONE", 0),
    ("FAILURE_REASON_OFFCHAIN", 1),
    ("FAILURE_REASON_TIMEOUT", 2),
    ("FAILURE_REASON_SWEEP_TIMEOUT", 3),
    ("FAILURE_REASON_INSUFFICIENT_VALUE", 4),
    ("FAILURE_REASON_TEMPORARY", 5),
    ("FAILURE_REASON_INCORRECT_AMOUNT", 6),
    ("FAILURE_REASON_ABANDONED", 7),
    ("FAILURE_REASON_INSUFFICIENT_CONFIRMED_BALANCE", 8),
    ("FAILURE_REASON_INCORRECT_HTLC_AMT_SWEPT", 9),
];

/// Code used for enum names this client does not know about.
pub const UNKNOWN_CODE: i32 = -1;

/// Response of `GET /v1/loop/swaps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSwapsResponse {
    #[serde(default)]
    pub swaps: Vec<SwapStatus>,
}

/// A single swap as reported by the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapStatus {
    #[serde(default, deserialize_with = "number")]
    pub amt: i64,
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type", deserialize_with = "swap_type")]
    pub swap_type: i32,
    #[serde(default, deserialize_with = "swap_state")]
    pub state: i32,
    #[serde(default, alias = "failureReason", deserialize_with = "failure_reason")]
    pub failure_reason: i32,
    /// Nanoseconds since the Unix epoch.
    #[serde(default, alias = "initiationTime", deserialize_with = "number")]
    pub initiation_time: i64,
    /// Nanoseconds since the Unix epoch.
    #[serde(default, alias = "lastUpdateTime", deserialize_with = "number")]
    pub last_update_time: i64,
    #[serde(default, alias = "htlcAddress")]
    pub htlc_address: String,
    #[serde(default, alias = "costServer", deserialize_with = "number")]
    pub cost_server: i64,
    #[serde(default, alias = "costOnchain", deserialize_with = "number")]
    pub cost_onchain: i64,
    #[serde(default, alias = "costOffchain", deserialize_with = "number")]
    pub cost_offchain: i64,
    #[serde(default, alias = "lastHop")]
    pub last_hop: Option<String>,
    #[serde(default, alias = "outgoingChanSet", deserialize_with = "numbers")]
    pub outgoing_chan_set: Vec<u64>,
    #[serde(default)]
    pub label: String,
}

/// Gateway error body: `{"code": 2, "message": "...", "details": []}`.
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayError {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

// ── Lenient decoders ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString<T> {
    Num(T),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeOrName {
    Code(i32),
    Name(String),
}

fn parse_number<T, E>(raw: NumOrString<T>) -> Result<T, E>
where
    T: FromStr,
    T::Err: fmt::Display,
    E: de::Error,
{
    match raw {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Str(s) => s.trim().parse().map_err(E::custom),
    }
}

fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    parse_number(NumOrString::deserialize(deserializer)?)
}

fn numbers<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    Vec::<NumOrString<T>>::deserialize(deserializer)?
        .into_iter()
        .map(parse_number)
        .collect()
}

/// Map an enum value to its numeric code; unknown names become [`UNKNOWN_CODE`].
pub fn enum_code(raw: &str, names: &[(&str, i32)]) -> i32 {
    if let Ok(code) = raw.trim().parse::<i32>() {
        return code;
    }
    names
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw.trim()))
        .map_or(UNKNOWN_CODE, |(_, code)| *code)
}

fn enum_field<'de, D>(deserializer: D, names: &[(&str, i32)]) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match CodeOrName::deserialize(deserializer)? {
        CodeOrName::Code(code) => code,
        CodeOrName::Name(name) => enum_code(&name, names),
    })
}

fn swap_state<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    enum_field(deserializer, SWAP_STATE_NAMES)
}

fn swap_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    enum_field(deserializer, SWAP_TYPE_NAMES)
}

fn failure_reason<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    enum_field(deserializer, FAILURE_REASON_NAMES)
}
