//! Shared server state.

use showroom_client::CacheController;
use showroom_compute::Compute;

/// Everything the tools operate on.
pub struct AppState {
    pub controller: CacheController,
    pub compute: Compute,
}
