use super::types::{Coord, RouteSummary};
use crate::sdk::error::GaodeError;

/// Seam between the batch loop and the network. The real implementation is
/// `RemoteAmapProvider`; tests drive the loop with a scripted stand-in.
pub trait RouteProvider {
    /// Fetches driving metrics for one origin/destination pair. Never retries
    /// internally; retry policy belongs to the caller.
    fn fetch_route(&self, origin: Coord, destination: Coord) -> Result<RouteSummary, GaodeError>;
}
