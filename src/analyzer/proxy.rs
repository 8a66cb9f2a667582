//! Proxy/router (MaxScale) analysis.
//!
//! Works from the proxy's own server, service and routing counters and is
//! independent of the topology analyzers. The topology only gates a few
//! router recommendations that apply to Galera.

use super::input::{ClusterReviewRequest, ProxyConfig, ProxyService, TopologyType};
use super::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};
use serde::{Deserialize, Serialize};

/// Replica query-share spread (percentage points) above which load is unbalanced.
const IMBALANCE_LIMIT_PCT: f64 = 20.0;

const ADAPTIVE_CRITERIA: &[&str] = &[
    "ADAPTIVE_ROUTING",
    "LEAST_GLOBAL_CONNECTIONS",
    "LEAST_ROUTER_CONNECTIONS",
];

// ============================================================================
// Report Types
// ============================================================================

/// Aggregate routing statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub total_client_connections: Option<u64>,
    pub current_client_connections: Option<u64>,
    pub connections_per_second: Option<f64>,
    pub total_queries_routed: u64,
    pub queries_per_second: Option<f64>,
    pub total_reads: u64,
    pub total_writes: u64,
    pub read_write_ratio: Option<f64>,
    pub transactions_total: u64,
    pub transactions_replayed: u64,
}

/// Share of connections and queries handled by one backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerShare {
    pub name: String,
    pub state: Option<String>,
    pub connections: Option<u64>,
    pub connection_pct: Option<f64>,
    pub queries: Option<u64>,
    pub query_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDistribution {
    pub servers: Vec<ServerShare>,
    pub balanced: bool,
    pub imbalance_pct: f64,
}

/// Result of analyzing the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyReport {
    pub healthy: bool,
    pub status: Severity,
    pub summary: String,
    pub server_count: usize,
    pub service_count: usize,
    pub traffic_stats: TrafficStats,
    pub load_distribution: LoadDistribution,
    #[serde(flatten)]
    pub output: ReviewFindings,
}

// ============================================================================
// Analysis
// ============================================================================

/// Analyze a proxy configuration in the context of a review request.
pub fn analyze_proxy(
    proxy: &ProxyConfig,
    request: &ClusterReviewRequest,
    topology: TopologyType,
) -> ProxyReport {
    let mut output = ReviewFindings::new();
    let traffic_stats = traffic_stats(proxy);
    let load_distribution = load_distribution(proxy);

    check_servers(proxy, &mut output);
    check_services(proxy, topology, &mut output);
    check_routing(proxy, request, topology, &mut output);
    check_traffic(proxy, &mut output);
    check_distribution(proxy, &load_distribution, &mut output);

    let critical = output.count(Severity::Critical);
    let warnings = output.count(Severity::Warning);
    let (healthy, status, summary) = if critical > 0 {
        (
            false,
            Severity::Critical,
            format!("MaxScale has {critical} critical issues"),
        )
    } else if warnings > 0 {
        (true, Severity::Warning, format!("MaxScale has {warnings} warnings"))
    } else {
        (
            true,
            Severity::Info,
            "MaxScale configuration appears healthy".to_string(),
        )
    };
    log::debug!("proxy analysis: {summary}");

    ProxyReport {
        healthy,
        status,
        summary,
        server_count: proxy.servers.len(),
        service_count: proxy.services.len(),
        traffic_stats,
        load_distribution,
        output,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `1234567` rendered as `1,234,567`.
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Sum of reported counters, pinned at `u64::MAX` instead of wrapping.
fn saturating_sum(values: impl Iterator<Item = Option<u64>>) -> u64 {
    values.flatten().fold(0, u64::saturating_add)
}

pub fn traffic_stats(proxy: &ProxyConfig) -> TrafficStats {
    let mut stats = TrafficStats {
        total_client_connections: proxy.total_connections,
        current_client_connections: proxy.current_connections,
        ..TrafficStats::default()
    };

    for service in &proxy.services {
        stats.total_writes = stats.total_writes.saturating_add(service.route_master.unwrap_or(0));
        stats.total_reads = stats.total_reads.saturating_add(service.route_slave.unwrap_or(0));
        stats.total_queries_routed = stats
            .total_queries_routed
            .saturating_add(service.route_all.unwrap_or(0));
        stats.transactions_total = stats.transactions_total.saturating_add(
            service
                .rw_transactions
                .unwrap_or(0)
                .saturating_add(service.ro_transactions.unwrap_or(0)),
        );
        stats.transactions_replayed = stats
            .transactions_replayed
            .saturating_add(service.replayed_transactions.unwrap_or(0));
    }
    stats.total_queries_routed = stats
        .total_queries_routed
        .saturating_add(saturating_sum(proxy.servers.iter().map(|s| s.queries)));

    if let Some(uptime) = proxy.uptime_seconds.filter(|u| *u > 0) {
        let uptime = uptime as f64;
        if let Some(total) = proxy.total_connections.filter(|t| *t > 0) {
            stats.connections_per_second = Some(round_to(total as f64 / uptime, 2));
        }
        if stats.total_queries_routed > 0 {
            stats.queries_per_second =
                Some(round_to(stats.total_queries_routed as f64 / uptime, 2));
        }
    }

    if stats.total_writes > 0 {
        stats.read_write_ratio = Some(round_to(
            stats.total_reads as f64 / stats.total_writes as f64,
            2,
        ));
    }
    stats
}

/// Per-server shares and the replica query-share spread. Servers whose state
/// mentions `master` are left out of the spread.
pub fn load_distribution(proxy: &ProxyConfig) -> LoadDistribution {
    let total_queries = saturating_sum(proxy.servers.iter().map(|s| s.queries));
    let total_connections = saturating_sum(proxy.servers.iter().map(|s| s.connections));

    let servers: Vec<ServerShare> = proxy
        .servers
        .iter()
        .map(|server| {
            let share = |part: Option<u64>, total: u64| {
                part.filter(|p| *p > 0 && total > 0)
                    .map(|p| round_to(p as f64 / total as f64 * 100.0, 1))
            };
            ServerShare {
                name: server.name.clone(),
                state: server.state.clone(),
                connections: server.connections,
                connection_pct: share(server.connections, total_connections),
                queries: server.queries,
                query_pct: share(server.queries, total_queries),
            }
        })
        .collect();

    let replica_shares: Vec<f64> = servers
        .iter()
        .zip(&proxy.servers)
        .filter(|(_, server)| !server.is_master())
        .filter_map(|(share, _)| share.query_pct)
        .collect();

    let mut imbalance_pct = 0.0;
    let mut balanced = true;
    if replica_shares.len() > 1 {
        let max = replica_shares.iter().copied().fold(f64::MIN, f64::max);
        let min = replica_shares.iter().copied().fold(f64::MAX, f64::min);
        imbalance_pct = round_to(max - min, 1);
        balanced = imbalance_pct <= IMBALANCE_LIMIT_PCT;
    }

    LoadDistribution {
        servers,
        balanced,
        imbalance_pct,
    }
}

fn check_servers(proxy: &ProxyConfig, output: &mut ReviewFindings) {
    if proxy.servers.is_empty() {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Configuration,
            "No servers defined",
            "MaxScale configuration has no server definitions",
        ));
        return;
    }

    let mut down = Vec::new();
    let mut maintenance = Vec::new();
    for server in &proxy.servers {
        let state = server.state_lower();
        if state.contains("down") {
            down.push(server.name.as_str());
        } else if state.contains("maintenance") {
            maintenance.push(server.name.as_str());
        }
    }

    if !down.is_empty() {
        output.finding(Finding::new(
            Severity::Critical,
            Category::Availability,
            "Servers down",
            format!("The following servers are down: {}", down.join(", ")),
        ));
    }
    if !maintenance.is_empty() {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Availability,
            "Servers in maintenance",
            format!(
                "The following servers are in maintenance: {}",
                maintenance.join(", ")
            ),
        ));
    }
}

fn check_services(proxy: &ProxyConfig, topology: TopologyType, output: &mut ReviewFindings) {
    if proxy.services.is_empty() {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Configuration,
            "No services defined",
            "MaxScale configuration has no service definitions",
        ));
        return;
    }

    for service in &proxy.services {
        let router = service.router.to_lowercase();
        if topology == TopologyType::Galera && router == "readconnroute" {
            output.finding(Finding::new(
                Severity::Info,
                Category::Configuration,
                "ReadConnRoute with Galera",
                format!(
                    "Service '{}' uses readconnroute. Consider readwritesplit for better query distribution.",
                    service.name
                ),
            ));
        }
        if router == "readwritesplit" {
            check_readwritesplit(service, output);
        }
        if service.servers.is_empty() {
            output.finding(Finding::new(
                Severity::Warning,
                Category::Configuration,
                "Service has no servers",
                format!("Service '{}' has no backend servers assigned", service.name),
            ));
        }
    }
}

fn check_readwritesplit(service: &ProxyService, output: &mut ReviewFindings) {
    if service.transaction_replay.is_none() {
        output.recommend(
            Recommendation::new(
                3,
                Category::Availability,
                "Consider transaction replay",
                format!(
                    "Service '{}' may benefit from transaction_replay",
                    service.name
                ),
            )
            .with_action("Enable transaction_replay=true for automatic retry on master failure")
            .with_impact("Improved availability during failover")
            .with_effort(Effort::Low),
        );
    }
    if service.master_accept_reads == Some(false) {
        output.finding(Finding::new(
            Severity::Info,
            Category::Configuration,
            "Master not accepting reads",
            format!(
                "Service '{}' has master_accept_reads=false. This is fine if you have dedicated read replicas.",
                service.name
            ),
        ));
    }
}

fn check_routing(
    proxy: &ProxyConfig,
    request: &ClusterReviewRequest,
    topology: TopologyType,
    output: &mut ReviewFindings,
) {
    let backends = proxy.servers.len();
    let nodes = request.nodes.len();
    if backends < nodes {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Configuration,
            "Not all nodes in MaxScale",
            format!("MaxScale has {backends} servers but cluster has {nodes} nodes"),
        ));
    }

    if topology == TopologyType::Galera {
        for service in &proxy.services {
            let Some(criteria) = service.slave_selection_criteria.as_deref() else {
                continue;
            };
            let criteria = criteria.to_uppercase();
            if !ADAPTIVE_CRITERIA.contains(&criteria.as_str()) {
                output.finding(Finding::new(
                    Severity::Info,
                    Category::Configuration,
                    "Review slave selection",
                    format!(
                        "Service '{}' uses {}. Consider ADAPTIVE_ROUTING for Galera.",
                        service.name, criteria
                    ),
                ));
            }
        }
    }

    if backends == 1 {
        output.recommend(
            Recommendation::new(
                2,
                Category::Availability,
                "Add more backend servers",
                "MaxScale only has one backend server",
            )
            .with_action("Add additional backend servers for failover capability")
            .with_impact("Improved availability")
            .with_effort(Effort::Medium),
        );
    }
}

fn check_traffic(proxy: &ProxyConfig, output: &mut ReviewFindings) {
    if let (Some(current), Some(total), Some(uptime)) = (
        proxy.current_connections.filter(|c| *c > 0),
        proxy.total_connections.filter(|t| *t > 0),
        proxy.uptime_seconds.filter(|u| *u > 3600),
    ) {
        let per_hour = total as f64 / uptime as f64 * 3600.0;
        if per_hour > current as f64 * 100.0 {
            output.recommend(
                Recommendation::new(
                    2,
                    Category::Performance,
                    "High connection churn detected",
                    format!(
                        "~{} connections/hour vs {} concurrent. Consider connection pooling on the application side.",
                        per_hour as u64, current
                    ),
                )
                .with_action("Implement connection pooling in the application")
                .with_impact("Reduced connection overhead")
                .with_effort(Effort::Medium),
            );
        }
    }

    for service in &proxy.services {
        if let Some(replayed) = service.replayed_transactions.filter(|r| *r > 0) {
            let severity = if replayed < 100 {
                Severity::Info
            } else {
                Severity::Warning
            };
            output.finding(Finding::new(
                severity,
                Category::Availability,
                "Transaction replays detected",
                format!(
                    "Service '{}' has {} replayed transactions, indicating failover events occurred.",
                    service.name, replayed
                ),
            ));
        }

        if let (Some(writes), Some(reads)) = (
            service.route_master.filter(|w| *w > 0),
            service.route_slave.filter(|r| *r > 0),
        ) {
            let total = writes.saturating_add(reads) as f64;
            let write_pct = writes as f64 / total * 100.0;
            let read_pct = reads as f64 / total * 100.0;
            output.finding(Finding::new(
                Severity::Info,
                Category::Performance,
                format!("Traffic distribution for {}", service.name),
                format!(
                    "Read traffic: {:.1}% ({} queries), Write traffic: {:.1}% ({} queries)",
                    read_pct,
                    thousands(reads),
                    write_pct,
                    thousands(writes)
                ),
            ));
            if write_pct > 50.0 {
                output.finding(Finding::new(
                    Severity::Info,
                    Category::Performance,
                    "Write-heavy workload",
                    format!(
                        "Service '{}' has {:.1}% writes. This is expected for OLTP workloads.",
                        service.name, write_pct
                    ),
                ));
            }
        }
    }
}

fn check_distribution(
    proxy: &ProxyConfig,
    distribution: &LoadDistribution,
    output: &mut ReviewFindings,
) {
    if !distribution.balanced {
        output.finding(Finding::new(
            Severity::Warning,
            Category::Performance,
            "Unbalanced read distribution",
            format!(
                "Replica query shares differ by {:.1} percentage points",
                distribution.imbalance_pct
            ),
        ));
        output.recommend(
            Recommendation::new(
                3,
                Category::Performance,
                "Review load balancing configuration",
                "Replica servers are handling uneven load",
            )
            .with_action("Review slave_selection_criteria setting. Consider ADAPTIVE_ROUTING.")
            .with_impact("Better query distribution")
            .with_effort(Effort::Low)
            .with_related("Unbalanced read distribution"),
        );
    }

    for server in &proxy.servers {
        if server.state_lower().contains("running") && server.queries == Some(0) {
            output.finding(Finding::new(
                Severity::Warning,
                Category::Configuration,
                "Server receiving no queries",
                format!(
                    "Server '{}' is running but has received no queries. Check if it's properly assigned to services.",
                    server.name
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::input::{NodeRole, NodeSnapshot, ProxyServer};

    fn server(name: &str, state: &str, queries: u64) -> ProxyServer {
        ProxyServer {
            name: name.to_string(),
            address: format!("10.0.0.{}", name.len()),
            port: 3306,
            state: Some(state.to_string()),
            connections: Some(10),
            queries: Some(queries),
            ..ProxyServer::default()
        }
    }

    fn rws_service() -> ProxyService {
        ProxyService {
            name: "rw".to_string(),
            router: "readwritesplit".to_string(),
            servers: vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
            route_master: Some(1000),
            route_slave: Some(4000),
            transaction_replay: Some(true),
            ..ProxyService::default()
        }
    }

    fn request(n: usize) -> ClusterReviewRequest {
        let nodes = (0..n)
            .map(|i| NodeSnapshot::new(format!("db{i}"), NodeRole::GaleraNode))
            .collect();
        ClusterReviewRequest::new("c", TopologyType::Galera, nodes)
    }

    #[test]
    fn test_down_server_is_critical() {
        let proxy = ProxyConfig {
            servers: vec![
                server("s1", "Master, Running", 500),
                server("s2", "Down", 0),
                server("s3", "Slave, Running", 500),
            ],
            services: vec![rws_service()],
            ..ProxyConfig::default()
        };
        let report = analyze_proxy(&proxy, &request(3), TopologyType::Galera);
        assert!(!report.healthy);
        assert_eq!(report.status, Severity::Critical);
        assert_eq!(report.summary, "MaxScale has 1 critical issues");
    }

    #[test]
    fn test_traffic_stats() {
        let proxy = ProxyConfig {
            servers: vec![server("s1", "Master, Running", 300), server("s2", "Slave, Running", 700)],
            services: vec![ProxyService {
                route_all: Some(200),
                rw_transactions: Some(10),
                ro_transactions: Some(5),
                replayed_transactions: Some(2),
                ..rws_service()
            }],
            uptime_seconds: Some(3),
            total_connections: Some(10),
            ..ProxyConfig::default()
        };
        let stats = traffic_stats(&proxy);
        assert_eq!(stats.total_writes, 1000);
        assert_eq!(stats.total_reads, 4000);
        assert_eq!(stats.total_queries_routed, 1200);
        assert_eq!(stats.queries_per_second, Some(400.0));
        assert_eq!(stats.connections_per_second, Some(3.33));
        assert_eq!(stats.read_write_ratio, Some(4.0));
        assert_eq!(stats.transactions_total, 15);
        assert_eq!(stats.transactions_replayed, 2);
    }

    #[test]
    fn test_counters_near_u64_max_saturate() {
        let service = ProxyService {
            route_master: Some(u64::MAX - 1),
            route_slave: Some(u64::MAX - 1),
            route_all: Some(u64::MAX),
            rw_transactions: Some(u64::MAX),
            ro_transactions: Some(u64::MAX),
            ..rws_service()
        };
        let proxy = ProxyConfig {
            servers: vec![
                server("s1", "Master, Running", u64::MAX),
                server("s2", "Slave, Running", u64::MAX),
                server("s3", "Slave, Running", u64::MAX),
            ],
            services: vec![service.clone(), service],
            uptime_seconds: Some(10),
            ..ProxyConfig::default()
        };

        let stats = traffic_stats(&proxy);
        assert_eq!(stats.total_writes, u64::MAX);
        assert_eq!(stats.total_reads, u64::MAX);
        assert_eq!(stats.total_queries_routed, u64::MAX);
        assert_eq!(stats.transactions_total, u64::MAX);
        assert_eq!(stats.read_write_ratio, Some(1.0));

        let dist = load_distribution(&proxy);
        assert_eq!(dist.servers.len(), 3);
        assert!(dist.balanced);

        let report = analyze_proxy(&proxy, &request(3), TopologyType::Galera);
        assert!(
            report
                .output
                .findings
                .iter()
                .any(|f| f.title == "Traffic distribution for rw")
        );
    }

    #[test]
    fn test_imbalance_excludes_master() {
        let proxy = ProxyConfig {
            servers: vec![
                server("s1", "Master, Running", 6000),
                server("s2", "Slave, Running", 3000),
                server("s3", "Slave, Running", 1000),
            ],
            services: vec![rws_service()],
            ..ProxyConfig::default()
        };
        let dist = load_distribution(&proxy);
        assert_eq!(dist.servers[0].query_pct, Some(60.0));
        assert_eq!(dist.imbalance_pct, 20.0);
        assert!(dist.balanced);

        let proxy = ProxyConfig {
            servers: vec![
                server("s1", "Master, Running", 1000),
                server("s2", "Slave, Running", 7000),
                server("s3", "Slave, Running", 2000),
            ],
            services: vec![rws_service()],
            ..ProxyConfig::default()
        };
        let report = analyze_proxy(&proxy, &request(3), TopologyType::Galera);
        assert!(!report.load_distribution.balanced);
        assert_eq!(report.load_distribution.imbalance_pct, 50.0);
        assert!(
            report
                .output
                .findings
                .iter()
                .any(|f| f.title == "Unbalanced read distribution")
        );
        assert_eq!(report.status, Severity::Warning);
    }

    #[test]
    fn test_idle_running_server_and_missing_nodes() {
        let proxy = ProxyConfig {
            servers: vec![server("s1", "Running", 0)],
            services: vec![ProxyService {
                transaction_replay: None,
                ..rws_service()
            }],
            ..ProxyConfig::default()
        };
        let report = analyze_proxy(&proxy, &request(3), TopologyType::MasterReplica);
        let titles: Vec<&str> = report
            .output
            .findings
            .iter()
            .map(|f| f.title.as_str())
            .collect();
        assert!(titles.contains(&"Server receiving no queries"));
        assert!(titles.contains(&"Not all nodes in MaxScale"));
        let recs: Vec<&str> = report
            .output
            .recommendations
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert!(recs.contains(&"Consider transaction replay"));
        assert!(recs.contains(&"Add more backend servers"));
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }
}
