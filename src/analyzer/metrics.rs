//! Derived metrics computed from raw counter snapshots.
//!
//! Every function here is total: whatever the status and variable maps hold,
//! the result is finite and non-negative. Rates divide by uptime, taken from
//! the snapshot's explicit `uptime_seconds` when positive, else the `Uptime`
//! status counter (default 1). A rate computed against a non-positive uptime
//! is 0.

use super::input::NodeSnapshot;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Clamp to a finite, non-negative value.
fn sane(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Uptime in seconds used as the rate denominator.
pub fn uptime_seconds(node: &NodeSnapshot) -> f64 {
    match node.uptime_seconds {
        Some(explicit) if explicit > 0 => explicit as f64,
        _ => node.status_int("Uptime", 1) as f64,
    }
}

fn per_second(node: &NodeSnapshot, counter: f64) -> f64 {
    let uptime = uptime_seconds(node);
    if uptime <= 0.0 {
        return 0.0;
    }
    sane(counter / uptime)
}

fn per_hour(node: &NodeSnapshot, counter: f64) -> f64 {
    let hours = uptime_seconds(node) / SECONDS_PER_HOUR;
    if hours <= 0.0 {
        return 0.0;
    }
    sane(counter / hours)
}

fn write_counter(node: &NodeSnapshot) -> f64 {
    ["Com_insert", "Com_update", "Com_delete", "Com_replace"]
        .iter()
        .map(|k| node.status_int(k, 0) as f64)
        .sum()
}

pub fn queries_per_second(node: &NodeSnapshot) -> f64 {
    per_second(node, node.status_int("Questions", 0) as f64)
}

/// Insert, update, delete and replace statements per second.
pub fn writes_per_second(node: &NodeSnapshot) -> f64 {
    per_second(node, write_counter(node))
}

pub fn reads_per_second(node: &NodeSnapshot) -> f64 {
    per_second(node, node.status_int("Com_select", 0) as f64)
}

/// `Max_used_connections / max_connections`, 0 when max_connections is 0.
pub fn connection_utilization(node: &NodeSnapshot) -> f64 {
    let max_used = node.status_int("Max_used_connections", 0) as f64;
    let max_connections = node.variable_int("max_connections", 1) as f64;
    if max_connections <= 0.0 {
        return 0.0;
    }
    sane(max_used / max_connections)
}

/// `1 - reads/read_requests`, exactly 1.0 when there were no read requests.
pub fn buffer_pool_hit_ratio(node: &NodeSnapshot) -> f64 {
    let reads = node.status_int("Innodb_buffer_pool_reads", 0) as f64;
    let requests = node.status_int("Innodb_buffer_pool_read_requests", 1) as f64;
    if requests <= 0.0 {
        return 1.0;
    }
    let ratio = 1.0 - reads / requests;
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// `pages_data / pages_total`, 0 when the pool size is unknown.
pub fn buffer_pool_usage(node: &NodeSnapshot) -> f64 {
    let data = node.status_int("Innodb_buffer_pool_pages_data", 0) as f64;
    let total = node.status_int("Innodb_buffer_pool_pages_total", 1) as f64;
    if total <= 0.0 {
        return 0.0;
    }
    sane(data / total)
}

/// Fraction of the buffer pool that is free.
pub fn buffer_pool_free_ratio(node: &NodeSnapshot) -> f64 {
    let free = node.status_int("Innodb_buffer_pool_pages_free", 0) as f64;
    let total = node.status_int("Innodb_buffer_pool_pages_total", 1) as f64;
    if total <= 0.0 {
        return 0.0;
    }
    sane(free / total)
}

pub fn slow_queries_per_hour(node: &NodeSnapshot) -> f64 {
    per_hour(node, node.status_int("Slow_queries", 0) as f64)
}

pub fn aborted_connects_per_hour(node: &NodeSnapshot) -> f64 {
    per_hour(node, node.status_int("Aborted_connects", 0) as f64)
}

// ============================================================================
// Galera
// ============================================================================

pub fn flow_control_paused(node: &NodeSnapshot) -> f64 {
    sane(node.wsrep_float("wsrep_flow_control_paused", 0.0))
}

pub fn recv_queue_avg(node: &NodeSnapshot) -> f64 {
    sane(node.wsrep_float("wsrep_local_recv_queue_avg", 0.0))
}

pub fn send_queue_avg(node: &NodeSnapshot) -> f64 {
    sane(node.wsrep_float("wsrep_local_send_queue_avg", 0.0))
}

pub fn cert_failures_per_hour(node: &NodeSnapshot) -> f64 {
    per_hour(node, node.wsrep_int("wsrep_local_cert_failures", 0) as f64)
}

/// Local commits per second, the de-duplicated Galera write rate.
pub fn local_commits_per_second(node: &NodeSnapshot) -> f64 {
    per_second(node, node.wsrep_int("wsrep_local_commits", 0) as f64)
}

// ============================================================================
// Replication
// ============================================================================

/// `Seconds_Behind_Master`, or `None` when missing, NULL or non-numeric.
pub fn replication_lag(node: &NodeSnapshot) -> Option<f64> {
    let raw = node.slave_str("Seconds_Behind_Master")?;
    let lag = raw.trim().parse::<f64>().ok()?;
    lag.is_finite().then(|| lag.max(0.0))
}

/// IO and SQL thread state; each is running only when reported as `Yes`.
pub fn replication_threads_running(node: &NodeSnapshot) -> (bool, bool) {
    let running = |key: &str| {
        node.slave_str(key)
            .map(|v| v.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    };
    (running("Slave_IO_Running"), running("Slave_SQL_Running"))
}
