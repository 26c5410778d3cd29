//! 订单服务层
//! 下单扣库存走数据库事务；取消回补库存；已支付订单取消触发尽力而为退款

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{OrderStatus, Role},
    error::AppError,
    infrastructure::{asaas::AsaasClient, db::PgPool, validation::validate_quantity},
    repository::{
        addresses, orders,
        orders::{CreateOrderInput, NewOrderItem, Order, OrderItem},
        products, stores,
    },
};

/// 订单 + 明细
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// 买家下单：所有商品必须属于同一家店，库存在事务内条件扣减
pub async fn create_order(
    pool: &PgPool,
    buyer_id: Uuid,
    address_id: Uuid,
    items: Vec<OrderItemRequest>,
) -> Result<OrderWithItems, AppError> {
    if items.is_empty() {
        return Err(AppError::bad_request("O pedido deve conter ao menos um item"));
    }

    // 收货地址必须属于买家；只校验归属，之后地址变更不影响已创建的订单
    addresses::get_for_user(pool, address_id, buyer_id)
        .await?
        .ok_or_else(|| AppError::bad_request("Endereço de entrega inválido"))?;

    let mut store_id: Option<Uuid> = None;
    let mut total = Decimal::ZERO;
    let mut new_items = Vec::with_capacity(items.len());

    for item in &items {
        validate_quantity(item.quantity).map_err(|e| AppError::bad_request(e.to_string()))?;

        let product = products::get_public_by_id(pool, item.product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;

        match store_id {
            None => store_id = Some(product.store_id),
            Some(sid) if sid != product.store_id => {
                return Err(AppError::bad_request(
                    "Todos os itens devem pertencer à mesma loja",
                ));
            }
            _ => {}
        }

        if product.stock < item.quantity {
            return Err(AppError::business_rule(format!(
                "Estoque insuficiente para o produto {}",
                product.name
            )));
        }

        total += product.price * Decimal::from(item.quantity);
        new_items.push(NewOrderItem {
            product_id: product.id,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }

    let store_id = store_id.ok_or_else(|| AppError::internal("pedido sem loja"))?;

    let order = orders::create(
        pool,
        CreateOrderInput {
            buyer_id,
            store_id,
            total,
            items: new_items,
        },
    )
    .await?
    // 预检通过但事务内扣减失败：并发下单竞争
    .ok_or_else(|| AppError::business_rule("Estoque insuficiente"))?;

    let order_items = orders::get_items(pool, order.id).await?;
    tracing::info!(order_id = %order.id, buyer_id = %buyer_id, total = %order.total, "pedido criado");

    Ok(OrderWithItems {
        order,
        items: order_items,
    })
}

/// 可见性：买家本人、店铺主、管理员；其余按不存在处理
pub async fn get_order(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    order_id: Uuid,
) -> Result<OrderWithItems, AppError> {
    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    if !can_view(pool, &order, actor_id, actor_role).await? {
        return Err(AppError::not_found("Pedido não encontrado"));
    }

    let items = orders::get_items(pool, order.id).await?;
    Ok(OrderWithItems { order, items })
}

async fn can_view(
    pool: &PgPool,
    order: &Order,
    actor_id: Uuid,
    actor_role: Role,
) -> Result<bool, AppError> {
    if actor_role == Role::Admin || order.buyer_id == actor_id {
        return Ok(true);
    }
    if actor_role == Role::Seller {
        if let Some(store) = stores::get_by_owner(pool, actor_id).await? {
            return Ok(store.id == order.store_id);
        }
    }
    Ok(false)
}

/// 买家看自己的订单；卖家看本店订单（无店铺时退回买家视角）
pub async fn list_orders(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Order>, i64), AppError> {
    if actor_role == Role::Seller {
        if let Some(store) = stores::get_by_owner(pool, actor_id).await? {
            let items = orders::list_by_store(pool, store.id, limit, offset).await?;
            let total = orders::count_by_store(pool, store.id).await?;
            return Ok((items, total));
        }
    }

    let items = orders::list_by_buyer(pool, actor_id, limit, offset).await?;
    let total = orders::count_by_buyer(pool, actor_id).await?;
    Ok((items, total))
}

/// 状态流转。卖家只能推进发货链（SHIPPED/DELIVERED），管理员可做任何合法流转
pub async fn update_status(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    order_id: Uuid,
    new_status: &str,
) -> Result<Order, AppError> {
    let target = OrderStatus::from_str(new_status)
        .ok_or_else(|| AppError::bad_request("Status inválido"))?;

    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    match actor_role {
        Role::Admin => {}
        Role::Seller => {
            let store = stores::get_by_owner(pool, actor_id)
                .await?
                .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;
            if store.id != order.store_id {
                return Err(AppError::not_found("Pedido não encontrado"));
            }
            if !matches!(target, OrderStatus::Shipped | OrderStatus::Delivered) {
                return Err(AppError::business_rule(
                    "Vendedores só podem marcar pedidos como enviados ou entregues",
                ));
            }
        }
        Role::Buyer => {
            return Err(AppError::forbidden(
                "Acesso negado. Permissões insuficientes",
            ));
        }
    }

    let current = OrderStatus::from_str(&order.status)
        .ok_or_else(|| AppError::internal("status de pedido desconhecido"))?;
    if !current.can_transition_to(&target) {
        return Err(AppError::business_rule(format!(
            "Transição de status inválida: {} → {}",
            current, target
        )));
    }

    apply_transition(pool, order_id, target).await
}

/// 转入CANCELLED必须回补库存，其余流转只改状态
async fn apply_transition(
    pool: &PgPool,
    order_id: Uuid,
    target: OrderStatus,
) -> Result<Order, AppError> {
    let updated = match target {
        OrderStatus::Cancelled => orders::cancel(pool, order_id).await?,
        _ => orders::update_status(pool, order_id, target.as_str()).await?,
    };
    updated.ok_or_else(|| AppError::not_found("Pedido não encontrado"))
}

/// 买家取消：仅PENDING/PAID。已支付的触发尽力而为退款，失败不阻塞取消
pub async fn cancel_order(
    pool: &PgPool,
    asaas: &AsaasClient,
    buyer_id: Uuid,
    order_id: Uuid,
) -> Result<Order, AppError> {
    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    if order.buyer_id != buyer_id {
        return Err(AppError::not_found("Pedido não encontrado"));
    }

    let current = OrderStatus::from_str(&order.status)
        .ok_or_else(|| AppError::internal("status de pedido desconhecido"))?;
    if !current.cancellable_by_buyer() {
        return Err(AppError::business_rule(
            "Pedido não pode ser cancelado no status atual",
        ));
    }

    let cancelled = orders::cancel(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    if current == OrderStatus::Paid {
        if let Some(payment_id) = &cancelled.payment_id {
            asaas.refund_best_effort(payment_id, "cancelamento de pedido").await;
        }
    }

    Ok(cancelled)
}

// ============ 管理端 ============

pub async fn admin_list_orders(
    pool: &PgPool,
    status: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Order>, i64), AppError> {
    if let Some(ref s) = status {
        OrderStatus::from_str(s).ok_or_else(|| AppError::bad_request("Status inválido"))?;
    }
    let items = orders::list_all(pool, status.clone(), limit, offset).await?;
    let total = orders::count_all(pool, status).await?;
    Ok((items, total))
}

/// 管理端流转可携带网关交易引用（确认支付时记录，退款依赖它）
pub async fn admin_update_status(
    pool: &PgPool,
    order_id: Uuid,
    new_status: &str,
    payment_id: Option<String>,
) -> Result<Order, AppError> {
    let target = OrderStatus::from_str(new_status)
        .ok_or_else(|| AppError::bad_request("Status inválido"))?;

    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    let current = OrderStatus::from_str(&order.status)
        .ok_or_else(|| AppError::internal("status de pedido desconhecido"))?;
    if !current.can_transition_to(&target) {
        return Err(AppError::business_rule(format!(
            "Transição de status inválida: {} → {}",
            current, target
        )));
    }

    if let Some(pid) = payment_id.as_deref().filter(|p| !p.trim().is_empty()) {
        orders::set_payment(pool, order_id, pid)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;
    }

    apply_transition(pool, order_id, target).await
}

/// 管理端强制退款：仅针对已有支付记录的订单，结果尽力而为
pub async fn admin_refund_order(
    pool: &PgPool,
    asaas: &AsaasClient,
    order_id: Uuid,
) -> Result<(), AppError> {
    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pedido não encontrado"))?;

    let payment_id = order
        .payment_id
        .as_deref()
        .ok_or_else(|| AppError::business_rule("Pedido sem pagamento associado"))?;

    asaas.refund_best_effort(payment_id, "reembolso administrativo").await;
    Ok(())
}
