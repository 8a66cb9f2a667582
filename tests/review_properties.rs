use proptest::prelude::*;

use mariadb_review::analyzer::SystemResources;
use mariadb_review::analyzer::metrics;
use mariadb_review::analyzer::thresholds::Tier;
use mariadb_review::{
    ClusterReviewRequest, NodeRole, NodeSnapshot, ReviewService, Severity, TopologyType,
    analyze_mariadb_log, analyze_sizing,
};

/// Property tests for the totality guarantees of the review engine.

const COUNTERS: &[&str] = &[
    "Uptime",
    "Questions",
    "Com_select",
    "Com_insert",
    "Com_update",
    "Com_delete",
    "Slow_queries",
    "Aborted_connects",
    "Max_used_connections",
    "Innodb_buffer_pool_reads",
    "Innodb_buffer_pool_read_requests",
    "Innodb_buffer_pool_pages_data",
    "Innodb_buffer_pool_pages_total",
    "Innodb_buffer_pool_pages_free",
    "wsrep_flow_control_paused",
    "wsrep_local_recv_queue_avg",
    "wsrep_local_cert_failures",
];

/// Counter values as they show up in real captures, plus garbage.
fn counter_value() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        (0u32..1_000_000).prop_map(|n| n.to_string()),
        any::<f64>().prop_map(|f| f.to_string()),
        Just(String::new()),
        Just("NULL".to_string()),
        "[a-zA-Z ]{0,8}",
    ]
}

fn node_strategy() -> impl Strategy<Value = NodeSnapshot> {
    (
        proptest::collection::vec(counter_value(), COUNTERS.len()),
        counter_value(),
    )
        .prop_map(|(values, max_connections)| {
            let mut node = NodeSnapshot::new("db1", NodeRole::Standalone);
            for (key, value) in COUNTERS.iter().zip(values) {
                node.global_status.insert(*key, value);
            }
            node.global_variables.insert("max_connections", max_connections);
            node
        })
}

/// OS resources over the whole `u32`/`f64` domain, including values the
/// request validation rejects.
fn resources_strategy() -> impl Strategy<Value = Option<SystemResources>> {
    let resources = (
        any::<u32>(),
        any::<f64>(),
        any::<f64>(),
        proptest::option::of(any::<f64>()),
        proptest::option::of(any::<f64>()),
        proptest::option::of(any::<f64>()),
        proptest::option::of(prop_oneof![Just("ssd".to_string()), Just("hdd".to_string())]),
    )
        .prop_map(|(cores, ram, disk, disk_used, cpu_pct, ram_pct, disk_type)| {
            let mut res = SystemResources::new(cores, ram, disk);
            res.disk_used_gb = disk_used;
            res.cpu_utilization_pct = cpu_pct;
            res.ram_utilization_pct = ram_pct;
            res.disk_type = disk_type;
            res
        });
    proptest::option::of(resources)
}

/// OS resources that pass request validation, up to the type limits.
fn valid_resources_strategy() -> impl Strategy<Value = Option<SystemResources>> {
    let resources = (
        1u32..=u32::MAX,
        1e-3f64..1e300,
        1e-3f64..1e300,
        proptest::option::of(0.0f64..=100.0),
        proptest::option::of(0.0f64..=100.0),
    )
        .prop_map(|(cores, ram, disk, cpu_pct, ram_pct)| {
            let mut res = SystemResources::new(cores, ram, disk);
            res.cpu_utilization_pct = cpu_pct;
            res.ram_utilization_pct = ram_pct;
            res
        });
    proptest::option::of(resources)
}

fn galera_request(
    resources: impl Strategy<Value = Option<SystemResources>>,
) -> impl Strategy<Value = ClusterReviewRequest> {
    proptest::collection::vec((node_strategy(), resources), 1..4).prop_map(|nodes| {
        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (mut node, resources))| {
                node.hostname = format!("db{i}");
                node.role = NodeRole::GaleraNode;
                node.system_resources = resources;
                node
            })
            .collect();
        ClusterReviewRequest::new("prop", TopologyType::Galera, nodes)
    })
}

fn is_sane(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Info),
        Just(Severity::Warning),
        Just(Severity::Critical)
    ]
}

proptest! {
    #[test]
    fn test_derived_metrics_are_finite_and_non_negative(node in node_strategy()) {
        prop_assert!(is_sane(metrics::queries_per_second(&node)));
        prop_assert!(is_sane(metrics::writes_per_second(&node)));
        prop_assert!(is_sane(metrics::reads_per_second(&node)));
        prop_assert!(is_sane(metrics::connection_utilization(&node)));
        prop_assert!(is_sane(metrics::buffer_pool_usage(&node)));
        prop_assert!(is_sane(metrics::buffer_pool_free_ratio(&node)));
        prop_assert!(is_sane(metrics::slow_queries_per_hour(&node)));
        prop_assert!(is_sane(metrics::aborted_connects_per_hour(&node)));
        prop_assert!(is_sane(metrics::flow_control_paused(&node)));
        prop_assert!(is_sane(metrics::recv_queue_avg(&node)));
        prop_assert!(is_sane(metrics::cert_failures_per_hour(&node)));

        let hit_ratio = metrics::buffer_pool_hit_ratio(&node);
        prop_assert!((0.0..=1.0).contains(&hit_ratio));
    }

    #[test]
    fn test_review_never_fails_on_bad_counters(node in node_strategy()) {
        let request = ClusterReviewRequest::new("prop", TopologyType::Standalone, vec![node]);
        let response = ReviewService::new().review(&request);
        prop_assert!(response.is_ok());
    }

    #[test]
    fn test_sizing_is_total_over_resources(request in galera_request(resources_strategy())) {
        let report = analyze_sizing(&request, TopologyType::Galera);
        prop_assert_eq!(report.per_node_analysis.len(), request.nodes.len());
        let cores = request
            .nodes
            .iter()
            .filter_map(|n| n.system_resources.as_ref())
            .fold(0u32, |total, r| total.saturating_add(r.cpu_cores));
        prop_assert_eq!(report.current_sizing.total_vcpus, cores);

        // Rejected requests fail cleanly instead of panicking.
        let response = ReviewService::new().review(&request);
        prop_assert_eq!(response.is_ok(), request.validate().is_ok());
    }

    #[test]
    fn test_review_accepts_extreme_valid_resources(
        request in galera_request(valid_resources_strategy()),
    ) {
        prop_assert!(request.validate().is_ok());
        let response = ReviewService::new().review(&request);
        prop_assert!(response.is_ok());
    }

    #[test]
    fn test_high_tier_is_monotonic(
        warning in 0.0f64..100.0,
        spread in 0.0f64..100.0,
        a in -50.0f64..250.0,
        b in -50.0f64..250.0,
    ) {
        let tier = Tier::new(warning, warning + spread);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tier.evaluate_high(low) <= tier.evaluate_high(high));
    }

    #[test]
    fn test_low_tier_is_antitonic(
        critical in 0.0f64..1.0,
        spread in 0.0f64..1.0,
        a in -1.0f64..3.0,
        b in -1.0f64..3.0,
    ) {
        let tier = Tier::new(critical + spread, critical);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tier.evaluate_low(low) >= tier.evaluate_low(high));
    }

    #[test]
    fn test_escalate_never_lowers(start in severity(), other in severity()) {
        let mut status = start;
        status.escalate(other);
        prop_assert!(status >= start);
        prop_assert!(status >= other);
    }

    #[test]
    fn test_log_classification_is_total(content in "(\\PC{0,60}\n){0,20}") {
        let report = analyze_mariadb_log(&content, "prop.log");
        prop_assert_eq!(report.summary.total_lines, content.split('\n').count());
        prop_assert!(report.summary.error_count <= report.summary.total_lines);
    }
}
