//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP / WebSocket 请求委托给应用层的用例服务。

mod auth;
mod error;
mod extract;
mod response;
mod routes;
mod state;
mod websocket;

pub use auth::{is_public, CurrentUser};
pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
