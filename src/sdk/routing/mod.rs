pub mod remote;
pub mod service;
pub mod types;

pub use remote::RemoteAmapProvider;
pub use service::RouteProvider;
pub use types::{Coord, DrivingApi, RouteSummary};
