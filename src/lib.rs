pub mod sdk;

pub use sdk::batch::{BatchRunner, RunReport};
pub use sdk::config::AmapConfig;
pub use sdk::error::GaodeError;
pub use sdk::geocode::GeocodeResolver;
pub use sdk::routing::{DrivingApi, RemoteAmapProvider, RouteProvider, RouteSummary};
pub use sdk::table::Table;
