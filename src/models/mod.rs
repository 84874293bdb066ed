//! 核心数据模型模块
//!
//! 定义会诊服务的核心数据结构：Session, Turn, MismatchAnalysis,
//! EmotionStatistics, SummaryResult 等。

pub mod analysis;
pub mod insights;
pub mod session;
pub mod turn;

pub use analysis::*;
pub use insights::*;
pub use session::*;
pub use turn::*;
