//! ASAAS支付网关客户端：带超时的最小实现
//! 配置见 `config::AsaasConfig`（ASAAS_API_URL / ASAAS_API_KEY / ASAAS_TIMEOUT_MS）
//!
//! 退款是尽力而为的副作用：失败只记日志和计数，从不阻塞主流程。

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Clone)]
pub struct AsaasClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

/// 网关调用错误
#[derive(Debug, Error)]
pub enum AsaasError {
    /// 网络或超时故障
    #[error("asaas transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// 网关返回非2xx
    #[error("asaas rejected request: {status} {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// 退款调用结果
#[derive(Debug)]
pub enum RefundOutcome {
    /// 网关未配置，跳过
    Skipped,
    /// 网关已受理
    Accepted { status: String },
}

#[derive(Deserialize)]
struct AsaasRefundBody {
    #[serde(default)]
    status: Option<String>,
}

impl AsaasClient {
    pub fn from_config(cfg: &crate::config::AsaasConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            http,
        }
    }

    /// 请求对指定支付做全额退款
    pub async fn refund_payment(&self, payment_id: &str) -> Result<RefundOutcome, AsaasError> {
        let Some(api_key) = &self.api_key else {
            return Ok(RefundOutcome::Skipped);
        };

        let url = format!("{}/payments/{}/refund", self.base_url, payment_id);
        let resp = self
            .http
            .post(&url)
            .header("access_token", api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AsaasError::Rejected { status, body });
        }

        let body: AsaasRefundBody = resp.json().await?;
        Ok(RefundOutcome::Accepted {
            status: body.status.unwrap_or_else(|| "REQUESTED".into()),
        })
    }

    /// 取消网关侧订阅（停止后续扣款）
    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), AsaasError> {
        let Some(api_key) = &self.api_key else {
            return Ok(());
        };

        let url = format!("{}/subscriptions/{}", self.base_url, subscription_id);
        let resp = self
            .http
            .delete(&url)
            .header("access_token", api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AsaasError::Rejected { status, body });
        }
        Ok(())
    }

    /// 尽力而为退款：失败记warn日志并递增失败计数，不向上传播
    pub async fn refund_best_effort(&self, payment_id: &str, context: &str) {
        match self.refund_payment(payment_id).await {
            Ok(RefundOutcome::Skipped) => {
                tracing::debug!(payment_id, context, "网关未配置，跳过退款");
            }
            Ok(RefundOutcome::Accepted { status }) => {
                tracing::info!(payment_id, context, %status, "退款请求已受理");
            }
            Err(e) => {
                crate::metrics::inc_refund_fail();
                tracing::warn!(payment_id, context, error = %e, "退款请求失败");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AsaasConfig;

    fn test_client(api_key: Option<String>) -> AsaasClient {
        AsaasClient::from_config(&AsaasConfig {
            api_url: "http://127.0.0.1:1".into(),
            api_key,
            timeout_ms: 100,
        })
    }

    #[tokio::test]
    async fn test_refund_skipped_when_gateway_disabled() {
        let client = test_client(None);

        let outcome = client.refund_payment("pay_000001").await.unwrap();
        assert!(matches!(outcome, RefundOutcome::Skipped));
        client.cancel_subscription("sub_000001").await.unwrap();
    }

    #[tokio::test]
    async fn test_refund_error_when_gateway_unreachable() {
        let client = test_client(Some("key".into()));

        let err = client.refund_payment("pay_000001").await.unwrap_err();
        assert!(matches!(err, AsaasError::Transport(_)));
    }
}
