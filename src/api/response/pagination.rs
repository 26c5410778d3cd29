// 统一分页参数与分页块

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// 响应中的分页块（camelCase与前端约定一致）
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = if page_size > 0 {
            ((total as f64) / (page_size as f64)).ceil() as u32
        } else {
            0
        };

        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// 查询串中的分页参数（?page=1&pageSize=20）
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// 规范化后的分页参数
#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u32,
    pub page_size: u32,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(20).clamp(1, 100), // 限制在1-100之间
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn to_block(&self, total: u64) -> Pagination {
        Pagination::new(self.page, self.page_size, total)
    }
}

impl From<PaginationQuery> for PaginationParams {
    fn from(q: PaginationQuery) -> Self {
        Self::new(q.page, q.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams::new(Some(2), Some(10));
        assert_eq!(params.page, 2);
        assert_eq!(params.page_size, 10);
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_pagination_params_clamped() {
        let params = PaginationParams::new(Some(0), Some(500));
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 100);

        let defaults = PaginationParams::new(None, None);
        assert_eq!(defaults.page, 1);
        assert_eq!(defaults.page_size, 20);

        // 超大页码不能在乘法里溢出
        let big = PaginationParams::new(Some(u32::MAX), Some(100));
        assert_eq!(big.offset(), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn test_pagination_block() {
        let block = Pagination::new(1, 10, 25);
        assert_eq!(block.total_pages, 3);
        assert_eq!(block.total, 25);
    }
}
