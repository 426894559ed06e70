pub mod model;
pub mod narrative;
pub mod protocol;
pub mod reducer;
pub mod scenario;
pub mod view;
