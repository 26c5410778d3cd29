use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 审计队列：写失败与队列满丢弃
    audit_write_fail: u64,
    audit_queue_full: u64,
    // 退款（尽力而为副作用）失败
    refund_fail: u64,
    // 安全中间件拒绝计数
    csrf_rejected: u64,
    rate_limited: u64,
}

fn state() -> &'static Mutex<MetricsState> {
    METRICS.get_or_init(|| {
        Mutex::new(MetricsState {
            total: 0,
            errors: 0,
            per_endpoint: HashMap::new(),
            per_endpoint_err: HashMap::new(),
            audit_write_fail: 0,
            audit_queue_full: 0,
            refund_fail: 0,
            csrf_rejected: 0,
            rate_limited: 0,
        })
    })
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    };
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn inc_audit_write_fail() {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.audit_write_fail += 1;
}

pub fn inc_audit_queue_full() {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.audit_queue_full += 1;
}

pub fn inc_refund_fail() {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.refund_fail += 1;
}

pub fn inc_csrf_rejected() {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.csrf_rejected += 1;
}

pub fn inc_rate_limited() {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.rate_limited += 1;
}

pub fn render_prometheus() -> String {
    let s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let mut out = String::new();
    out.push_str("# HELP marketcore_requests_total Total requests\n");
    out.push_str("# TYPE marketcore_requests_total counter\n");
    out.push_str(&format!("marketcore_requests_total {}\n", s.total));

    out.push_str("# HELP marketcore_errors_total Total error responses\n");
    out.push_str("# TYPE marketcore_errors_total counter\n");
    out.push_str(&format!("marketcore_errors_total {}\n", s.errors));

    out.push_str("# HELP marketcore_endpoint_requests_total Requests per endpoint\n");
    out.push_str("# TYPE marketcore_endpoint_requests_total counter\n");
    for (k, v) in s.per_endpoint.iter() {
        out.push_str(&format!(
            "marketcore_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    out.push_str("# HELP marketcore_endpoint_errors_total Errors per endpoint\n");
    out.push_str("# TYPE marketcore_endpoint_errors_total counter\n");
    for (k, v) in s.per_endpoint_err.iter() {
        out.push_str(&format!(
            "marketcore_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    out.push_str("# HELP marketcore_audit_write_fail_total Failed audit log writes\n");
    out.push_str("# TYPE marketcore_audit_write_fail_total counter\n");
    out.push_str(&format!(
        "marketcore_audit_write_fail_total {}\n",
        s.audit_write_fail
    ));

    out.push_str("# HELP marketcore_audit_queue_full_total Audit entries dropped on full queue\n");
    out.push_str("# TYPE marketcore_audit_queue_full_total counter\n");
    out.push_str(&format!(
        "marketcore_audit_queue_full_total {}\n",
        s.audit_queue_full
    ));

    out.push_str("# HELP marketcore_refund_fail_total Failed best-effort gateway refunds\n");
    out.push_str("# TYPE marketcore_refund_fail_total counter\n");
    out.push_str(&format!("marketcore_refund_fail_total {}\n", s.refund_fail));

    out.push_str("# HELP marketcore_csrf_rejected_total Requests rejected by CSRF validation\n");
    out.push_str("# TYPE marketcore_csrf_rejected_total counter\n");
    out.push_str(&format!(
        "marketcore_csrf_rejected_total {}\n",
        s.csrf_rejected
    ));

    out.push_str("# HELP marketcore_rate_limited_total Requests rejected by rate limiting\n");
    out.push_str("# TYPE marketcore_rate_limited_total counter\n");
    out.push_str(&format!("marketcore_rate_limited_total {}\n", s.rate_limited));

    out
}

/// 管理端统计面板读取的审计失败总数
pub fn audit_failure_count() -> u64 {
    let s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    s.audit_write_fail + s.audit_queue_full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_marketplace_counters() {
        inc_audit_write_fail();
        inc_refund_fail();
        inc_csrf_rejected();
        inc_rate_limited();
        let out = render_prometheus();
        assert!(out.contains("marketcore_audit_write_fail_total"));
        assert!(out.contains("marketcore_refund_fail_total"));
        assert!(out.contains("marketcore_csrf_rejected_total"));
        assert!(out.contains("marketcore_rate_limited_total"));
    }

    #[test]
    fn test_audit_failure_count_combines_sources() {
        // 计数器是进程级全局，其他并发用例也会递增，只断言下界
        let before = audit_failure_count();
        inc_audit_write_fail();
        inc_audit_queue_full();
        assert!(audit_failure_count() >= before + 2);
    }
}
