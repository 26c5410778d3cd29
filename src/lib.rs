//! MarketCore - 多商户电商平台后端
//!
//! 买家、卖家与管理员三种角色：卖家按订阅开店上架，买家下单，
//! 管理员全量管理并留下审计轨迹。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod repository;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{OrderStatus, Role, SubscriptionStatus},
        error::{AppError, AppErrorCode},
    };
}
