//! MedConsult - AI 医生视频问诊后端
//!
//! 结合患者话语与面部表情进行多轮问诊，会诊结束后生成总结和情绪统计。

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod speech;
