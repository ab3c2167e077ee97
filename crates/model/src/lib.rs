pub mod location;
pub mod route;
pub mod statistics;

pub use location::{GeoPoint, SavedLocation};
pub use route::Route;
pub use statistics::{compute_statistics, RouteStatistics};

/// Title of the first point of every route.
pub const STARTING_POINT_TITLE: &str = "Starting point";

/// Format used to title every point after the starting point.
pub const TIME_TITLE_FORMAT: &str = "%H:%M:%S";

pub trait ExampleData {
    fn example_data() -> Self;
}
