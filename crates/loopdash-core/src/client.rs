// ── RPC client boundary ──
//
// The store only ever needs one call: list every swap. Anything that can
// answer it (the REST client, a test fake) plugs in here.

use futures_util::future::BoxFuture;
use loopdash_api::LoopClient;

use crate::error::CoreError;
use crate::model::SwapRecord;

/// Source of swap records for a [`SwapStore`](crate::SwapStore).
///
/// Errors are reported by the store, never propagated; their `Display`
/// text is what the user sees.
pub trait SwapClient: Send + Sync {
    fn list_swaps(&self) -> BoxFuture<'_, Result<Vec<SwapRecord>, CoreError>>;
}

impl SwapClient for LoopClient {
    fn list_swaps(&self) -> BoxFuture<'_, Result<Vec<SwapRecord>, CoreError>> {
        Box::pin(async move {
            let raw = LoopClient::list_swaps(self).await?;
            Ok(raw.into_iter().map(SwapRecord::from).collect())
        })
    }
}
