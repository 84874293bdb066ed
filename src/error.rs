//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 上游服务不可用（网络错误、超时、非 2xx 响应）
    #[error("上游服务不可用: {0}")]
    UpstreamUnavailable(String),

    /// 上游拒绝生成（安全过滤或空候选）
    #[error("上游拒绝生成: {0}")]
    UpstreamBlocked(String),

    /// 缺少必需的配置项（启动时致命）
    #[error("缺少配置: {0}")]
    ConfigurationMissing(String),

    /// 情绪序列与时间戳序列长度不一致
    #[error("输入长度不一致: emotions={emotions}, timestamps={timestamps}")]
    InputShapeMismatch { emotions: usize, timestamps: usize },

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Serialization(e.to_string())
        } else {
            AppError::UpstreamUnavailable(e.to_string())
        }
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let mut body = ErrorResponse::new(&code, &self.to_string());
        if let AppError::InputShapeMismatch { emotions, timestamps } = &self {
            body = body.with_details(&format!(
                "emotions: {}, timestamps: {}",
                emotions, timestamps
            ));
        }
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::InputShapeMismatch { .. } => (400, "INPUT_SHAPE_MISMATCH".to_string()),
            AppError::UpstreamUnavailable(_) => (502, "UPSTREAM_UNAVAILABLE".to_string()),
            AppError::UpstreamBlocked(_) => (502, "UPSTREAM_BLOCKED".to_string()),
            AppError::ConfigurationMissing(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = (&AppError::InputShapeMismatch {
            emotions: 3,
            timestamps: 2,
        })
            .into();
        assert_eq!(status, 400);
        assert_eq!(code, "INPUT_SHAPE_MISMATCH");

        let (status, _) = (&AppError::UpstreamBlocked("SAFETY".into())).into();
        assert_eq!(status, 502);

        let (status, code) = (&AppError::Io("disk".into())).into();
        assert_eq!(status, 500);
        assert_eq!(code, "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_shape_mismatch_response_carries_lengths() {
        let response = AppError::InputShapeMismatch {
            emotions: 3,
            timestamps: 2,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "INPUT_SHAPE_MISMATCH");
        assert_eq!(body.details.as_deref(), Some("emotions: 3, timestamps: 2"));
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("session".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
