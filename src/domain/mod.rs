//! 领域枚举：用户角色、订单与订阅状态机

use std::fmt;

use serde::{Deserialize, Serialize};

/// 用户角色（数据库中以大写字符串存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::Admin => "ADMIN",
        }
    }

    /// 从字符串解析；未知角色返回None，令牌校验处按无效令牌处理
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUYER" => Some(Self::Buyer),
            "SELLER" => Some(Self::Seller),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 订单状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// 已创建，等待支付
    Pending,

    /// 已支付，等待发货
    Paid,

    /// 已发货
    Shipped,

    /// 已送达
    Delivered,

    /// 已取消
    Cancelled,
}

impl OrderStatus {
    /// 面向用户的状态描述
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Aguardando pagamento",
            Self::Paid => "Pagamento confirmado",
            Self::Shipped => "Pedido enviado",
            Self::Delivered => "Pedido entregue",
            Self::Cancelled => "Pedido cancelado",
        }
    }

    /// 是否为最终状态（不可再转换）
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// 验证状态转换合法性
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;

        match (self, target) {
            (Pending, Paid) | (Pending, Cancelled) => true,
            (Paid, Shipped) | (Paid, Cancelled) => true,
            (Shipped, Delivered) => true,
            _ if self.is_final() => false,
            _ => false,
        }
    }

    /// 买家是否可以主动取消（仅支付前后，发货后不可）
    pub fn cancellable_by_buyer(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 订阅状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            "EXPIRED" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(&Paid));
        assert!(Pending.can_transition_to(&Cancelled));
        assert!(Paid.can_transition_to(&Shipped));
        assert!(Shipped.can_transition_to(&Delivered));

        assert!(!Pending.can_transition_to(&Shipped));
        assert!(!Shipped.can_transition_to(&Cancelled));
        assert!(!Delivered.can_transition_to(&Pending));
        assert!(!Cancelled.can_transition_to(&Paid));
    }

    #[test]
    fn test_buyer_cancellation_window() {
        assert!(OrderStatus::Pending.cancellable_by_buyer());
        assert!(OrderStatus::Paid.cancellable_by_buyer());
        assert!(!OrderStatus::Shipped.cancellable_by_buyer());
        assert!(!OrderStatus::Delivered.cancellable_by_buyer());
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("buyer"), Some(Role::Buyer));
        assert_eq!(Role::from_str("superuser"), None);
        assert_eq!(Role::Seller.as_str(), "SELLER");
    }

    #[test]
    fn test_subscription_status_parse() {
        assert_eq!(
            SubscriptionStatus::from_str("active"),
            Some(SubscriptionStatus::Active)
        );
        assert!(SubscriptionStatus::Cancelled.is_final());
        assert!(!SubscriptionStatus::Active.is_final());
    }

    #[test]
    fn test_serde_uppercase_wire_format() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let parsed: OrderStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(parsed, OrderStatus::Pending);
    }
}
