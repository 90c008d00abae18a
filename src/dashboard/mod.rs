pub mod list;
pub mod player;
pub mod render;

pub use list::{IncidentListState, LoadState};
pub use player::{PlayerState, PLACEHOLDER_IMAGE};
pub use render::render_dashboard;
