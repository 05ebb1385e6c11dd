// ── Swap domain types ──
//
// Raw swap records as delivered by the daemon, plus the typed views over
// their numeric codes. Codes stay raw `i32` on the record so that values
// this build does not know about survive and resolve to "Unknown".

use strum::{EnumIter, FromRepr, IntoStaticStr};

/// Label returned for any code without a defined mapping.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Lifecycle state of a swap (`looprpc.SwapState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(i32)]
pub enum SwapState {
    #[strum(serialize = "Initiated")]
    Initiated = 0,
    #[strum(serialize = "Preimage Revealed")]
    PreimageRevealed = 1,
    #[strum(serialize = "HTLC Published")]
    HtlcPublished = 2,
    #[strum(serialize = "Success")]
    Success = 3,
    #[strum(serialize = "Failed")]
    Failed = 4,
    #[strum(serialize = "Invoice Settled")]
    InvoiceSettled = 5,
}

impl SwapState {
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    #[allow(clippy::as_conversions)]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether the swap can still make progress.
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Initiated | Self::PreimageRevealed | Self::HtlcPublished
        )
    }

    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Direction of a swap (`looprpc.SwapType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(i32)]
pub enum SwapType {
    #[strum(serialize = "Loop Out")]
    LoopOut = 0,
    #[strum(serialize = "Loop In")]
    LoopIn = 1,
}

impl SwapType {
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    #[allow(clippy::as_conversions)]
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Why a swap failed (`looprpc.FailureReason`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(i32)]
pub enum FailureReason {
    #[strum(serialize = "")]
    None = 0,
    #[strum(serialize = "Off-chain Payment Failed")]
    Offchain = 1,
    #[strum(serialize = "Timeout")]
    Timeout = 2,
    #[strum(serialize = "Sweep Timeout")]
    SweepTimeout = 3,
    #[strum(serialize = "Insufficient Value")]
    InsufficientValue = 4,
    #[strum(serialize = "Temporary Failure")]
    Temporary = 5,
    #[strum(serialize = "Incorrect Amount")]
    IncorrectAmount = 6,
    #[strum(serialize = "Abandoned")]
    Abandoned = 7,
    #[strum(serialize = "Insufficient Confirmed Balance")]
    InsufficientConfirmedBalance = 8,
    #[strum(serialize = "Incorrect HTLC Amount Swept")]
    IncorrectHtlcAmountSwept = 9,
}

impl FailureReason {
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    #[allow(clippy::as_conversions)]
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Display label for a state code. Total over `i32`.
pub fn state_label(code: i32) -> &'static str {
    SwapState::from_code(code).map_or(UNKNOWN_LABEL, SwapState::label)
}

/// Display name for a type code. Total over `i32`.
pub fn type_name(code: i32) -> &'static str {
    SwapType::from_code(code).map_or(UNKNOWN_LABEL, SwapType::label)
}

/// Display label for a failure code; empty when there was no failure.
pub fn failure_label(code: i32) -> &'static str {
    FailureReason::from_code(code).map_or(UNKNOWN_LABEL, FailureReason::label)
}

/// Unrecognized codes are terminal so an unknown state never polls forever.
pub fn is_pending_state(code: i32) -> bool {
    SwapState::from_code(code).is_some_and(SwapState::is_pending)
}

// ── Raw record ──────────────────────────────────────────────────────

/// One swap exactly as the daemon reported it.
///
/// Immutable once produced; the store copies it into a [`SwapEntity`]
/// rather than mutating it.
///
/// [`SwapEntity`]: super::SwapEntity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapRecord {
    pub id: String,
    /// Swap amount in satoshis.
    pub amount: i64,
    pub state: i32,
    pub swap_type: i32,
    pub failure_reason: i32,
    /// Nanoseconds since the Unix epoch.
    pub initiation_time: i64,
    /// Nanoseconds since the Unix epoch.
    pub last_update_time: i64,
    pub htlc_address: String,
    pub cost_server: i64,
    pub cost_onchain: i64,
    pub cost_offchain: i64,
    pub outgoing_chan_set: Vec<u64>,
    pub last_hop: Option<String>,
    pub label: String,
}
