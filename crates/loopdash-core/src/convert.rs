// ── Wire → domain conversion ──
//
// Translates `loopdash_api` wire values into canonical domain records.
// The wire layer has already normalized enum names to codes.

use loopdash_api::SwapStatus;

use crate::model::SwapRecord;

impl From<SwapStatus> for SwapRecord {
    fn from(s: SwapStatus) -> Self {
        Self {
            id: s.id,
            amount: s.amt,
            state: s.state,
            swap_type: s.swap_type,
            failure_reason: s.failure_reason,
            initiation_time: s.initiation_time,
            last_update_time: s.last_update_time,
            htlc_address: s.htlc_address,
            cost_server: s.cost_server,
            cost_onchain: s.cost_onchain,
            cost_offchain: s.cost_offchain,
            outgoing_chan_set: s.outgoing_chan_set,
            last_hop: s.last_hop.filter(|hop| !hop.is_empty()),
            label: s.label,
        }
    }
}
