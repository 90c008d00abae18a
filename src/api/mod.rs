pub mod rest;

pub use rest::{router, ApiError, ApiQuery, AppState, RestApi};
