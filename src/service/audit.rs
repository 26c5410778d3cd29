//! 审计记录服务
//! 写入是fire-and-forget：有界队列 + 单个后台worker落库。
//! 队列满或写库失败只计数并告警，绝不影响请求响应。

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    infrastructure::db::PgPool,
    metrics,
    repository::{
        audit_logs::{self, AuditLog, NewAuditLog},
        orders, products, stores, users,
    },
};

/// 队列容量：满了就丢，at-most-once
pub const AUDIT_QUEUE_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct AuditRecorder {
    sender: mpsc::Sender<NewAuditLog>,
}

impl AuditRecorder {
    /// 启动后台worker并返回入队句柄
    pub fn start(pool: PgPool) -> Self {
        let (sender, mut receiver) = mpsc::channel::<NewAuditLog>(AUDIT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                if let Err(e) = audit_logs::insert(&pool, entry).await {
                    metrics::inc_audit_write_fail();
                    tracing::warn!(error = %e, "falha ao gravar log de auditoria");
                }
            }
        });

        Self { sender }
    }

    /// 入队即返回，从不阻塞调用方
    pub fn record(&self, entry: NewAuditLog) {
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                metrics::inc_audit_queue_full();
                tracing::warn!(
                    action = %dropped.action,
                    resource = %dropped.resource,
                    "fila de auditoria cheia, registro descartado"
                );
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                metrics::inc_audit_write_fail();
                tracing::warn!(
                    action = %dropped.action,
                    resource = %dropped.resource,
                    "worker de auditoria encerrado, registro descartado"
                );
            }
        }
    }

    #[cfg(test)]
    fn with_sender(sender: mpsc::Sender<NewAuditLog>) -> Self {
        Self { sender }
    }
}

// ============ 查询端 ============

pub async fn list_logs(
    pool: &PgPool,
    admin_id: Option<Uuid>,
    resource: Option<String>,
    success: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AuditLog>, i64), AppError> {
    let items = audit_logs::list(pool, admin_id, resource.clone(), success, limit, offset).await?;
    let total = audit_logs::count(pool, admin_id, resource, success).await?;
    Ok((items, total))
}

/// 平台总览，含可观测的审计丢失计数
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub audit_failures: u64,
}

pub async fn admin_stats(pool: &PgPool) -> Result<AdminStats, AppError> {
    // 五个聚合互不依赖，并发取数
    let (total_users, total_stores, total_products, total_orders, total_revenue) =
        futures::try_join!(
            users::count_all(pool),
            stores::count_all(pool),
            products::count_all(pool),
            orders::count_all(pool, None),
            orders::total_revenue(pool),
        )?;

    Ok(AdminStats {
        total_users,
        total_stores,
        total_products,
        total_orders,
        total_revenue,
        audit_failures: metrics::audit_failure_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> NewAuditLog {
        NewAuditLog {
            admin_id: Uuid::new_v4(),
            admin_name: "Admin Teste".into(),
            action: "update".into(),
            resource: "user".into(),
            resource_id: None,
            details: serde_json::json!({"method": "PUT"}),
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
            success: true,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn test_record_never_blocks_when_queue_full() {
        let (sender, _receiver) = mpsc::channel(1);
        let recorder = AuditRecorder::with_sender(sender);

        let before = metrics::audit_failure_count();
        recorder.record(sample_entry());
        // 容量1且无人消费，第二条必然丢弃
        recorder.record(sample_entry());

        assert!(metrics::audit_failure_count() > before);
    }

    #[tokio::test]
    async fn test_record_counts_drop_when_worker_gone() {
        let (sender, receiver) = mpsc::channel(4);
        drop(receiver);
        let recorder = AuditRecorder::with_sender(sender);

        let before = metrics::audit_failure_count();
        recorder.record(sample_entry());
        assert!(metrics::audit_failure_count() > before);
    }
}
