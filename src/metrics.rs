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
    // 上游（TEE / Intmax / RPC）成功/失败与时延统计（毫秒）
    upstream_ok: u64,
    upstream_err: u64,
    upstream_latency_sum_ms: u128,
    // 简易直方图分桶（毫秒）：<50, <100, <250, <500, <1000, >=1000
    upstream_hist_buckets: [u64; 6],
}

fn state() -> &'static Mutex<MetricsState> {
    METRICS.get_or_init(|| {
        Mutex::new(MetricsState {
            total: 0,
            errors: 0,
            per_endpoint: HashMap::new(),
            per_endpoint_err: HashMap::new(),
            upstream_ok: 0,
            upstream_err: 0,
            upstream_latency_sum_ms: 0,
            upstream_hist_buckets: [0; 6],
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

pub fn observe_upstream_latency_ms(ms: u128, ok: bool) {
    let mut s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if ok {
        s.upstream_ok += 1;
    } else {
        s.upstream_err += 1;
    }
    s.upstream_latency_sum_ms += ms;
    let idx = match ms {
        0..=49 => 0,
        50..=99 => 1,
        100..=249 => 2,
        250..=499 => 3,
        500..=999 => 4,
        _ => 5,
    };
    s.upstream_hist_buckets[idx] += 1;
}

pub fn render_prometheus() -> String {
    let s = match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let mut out = String::new();
    out.push_str("# HELP substream_requests_total Total requests\n");
    out.push_str("# TYPE substream_requests_total counter\n");
    out.push_str(&format!("substream_requests_total {}\n", s.total));

    out.push_str("# HELP substream_errors_total Total error responses\n");
    out.push_str("# TYPE substream_errors_total counter\n");
    out.push_str(&format!("substream_errors_total {}\n", s.errors));

    for (ep, n) in s.per_endpoint.iter() {
        out.push_str(&format!(
            "substream_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
            ep, n
        ));
    }
    for (ep, n) in s.per_endpoint_err.iter() {
        out.push_str(&format!(
            "substream_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
            ep, n
        ));
    }

    out.push_str("# HELP substream_upstream_ok_total Upstream success count\n");
    out.push_str("# TYPE substream_upstream_ok_total counter\n");
    out.push_str(&format!("substream_upstream_ok_total {}\n", s.upstream_ok));
    out.push_str("# HELP substream_upstream_err_total Upstream failure count\n");
    out.push_str("# TYPE substream_upstream_err_total counter\n");
    out.push_str(&format!("substream_upstream_err_total {}\n", s.upstream_err));
    out.push_str(&format!(
        "substream_upstream_latency_sum_ms {}\n",
        s.upstream_latency_sum_ms
    ));

    let bounds = ["50", "100", "250", "500", "1000", "+Inf"];
    let mut cumulative = 0u64;
    for (i, b) in bounds.iter().enumerate() {
        cumulative += s.upstream_hist_buckets[i];
        out.push_str(&format!(
            "substream_upstream_latency_ms_bucket{{le=\"{}\"}} {}\n",
            b, cumulative
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_render() {
        count_ok("GET /api/user");
        count_err("GET /api/user");
        observe_upstream_latency_ms(42, true);
        observe_upstream_latency_ms(600, false);

        let rendered = render_prometheus();
        assert!(rendered.contains("substream_requests_total"));
        assert!(rendered.contains("endpoint=\"GET /api/user\""));
        assert!(rendered.contains("substream_upstream_latency_ms_bucket"));
    }
}
