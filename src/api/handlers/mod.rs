//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod chat_handler;
pub mod insights_handler;
pub mod session_handler;
pub mod speech_handler;

pub use chat_handler::*;
pub use insights_handler::*;
pub use session_handler::*;
pub use speech_handler::*;
