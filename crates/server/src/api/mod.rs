pub mod error;
pub mod handlers;
pub mod jobs;
pub mod lipsync;
pub mod middleware;
pub mod output;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
