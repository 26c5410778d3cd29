//! 订阅服务层
//! 取消订阅会请求网关退款，退款失败从不阻塞取消

use uuid::Uuid;

use crate::{
    domain::{Role, SubscriptionStatus},
    error::AppError,
    infrastructure::{asaas::AsaasClient, db::PgPool},
    repository::{
        plans,
        subscriptions::{self, Subscription},
    },
};

/// 订阅周期：30天
const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

pub async fn subscribe(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Subscription, AppError> {
    plans::get_active_by_id(pool, plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("Plano não encontrado"))?;

    if subscriptions::get_active_by_user(pool, user_id).await?.is_some() {
        return Err(AppError::conflict("Você já possui uma assinatura ativa"));
    }

    let expires_at = chrono::Utc::now() + chrono::Duration::days(SUBSCRIPTION_PERIOD_DAYS);
    let subscription = subscriptions::create(pool, user_id, plan_id, Some(expires_at)).await?;

    tracing::info!(subscription_id = %subscription.id, user_id = %user_id, plan_id = %plan_id, "assinatura criada");
    Ok(subscription)
}

pub async fn list_mine(pool: &PgPool, user_id: Uuid) -> Result<Vec<Subscription>, AppError> {
    Ok(subscriptions::list_by_user(pool, user_id).await?)
}

/// 取消：本人或管理员。只有ACTIVE可取消
pub async fn cancel(
    pool: &PgPool,
    asaas: &AsaasClient,
    actor_id: Uuid,
    actor_role: Role,
    subscription_id: Uuid,
) -> Result<Subscription, AppError> {
    let subscription = subscriptions::get_by_id(pool, subscription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Assinatura não encontrada"))?;

    if actor_role != Role::Admin && subscription.user_id != actor_id {
        return Err(AppError::not_found("Assinatura não encontrada"));
    }

    let status = SubscriptionStatus::from_str(&subscription.status)
        .ok_or_else(|| AppError::internal("status de assinatura desconhecido"))?;
    if status != SubscriptionStatus::Active {
        return Err(AppError::business_rule("Assinatura não está ativa"));
    }

    let cancelled = subscriptions::cancel(pool, subscription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Assinatura não encontrada"))?;

    // 网关侧停止扣款并退款，尽力而为
    if let Some(payment_id) = &cancelled.payment_id {
        if let Err(e) = asaas.cancel_subscription(payment_id).await {
            tracing::warn!(subscription_id = %subscription_id, error = %e, "falha ao cancelar assinatura no gateway");
        }
        asaas
            .refund_best_effort(payment_id, "cancelamento de assinatura")
            .await;
    }

    Ok(cancelled)
}

// ============ 管理端 ============

pub async fn admin_list(
    pool: &PgPool,
    status: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Subscription>, i64), AppError> {
    if let Some(ref s) = status {
        SubscriptionStatus::from_str(s)
            .ok_or_else(|| AppError::bad_request("Status inválido"))?;
    }
    let items = subscriptions::list_all(pool, status.clone(), limit, offset).await?;
    let total = subscriptions::count_all(pool, status).await?;
    Ok((items, total))
}
