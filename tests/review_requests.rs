use mariadb_review::analyzer::logs::EventKind;
use mariadb_review::{
    ClusterReviewRequest, LogAnalysisInput, ReviewError, ReviewService, Severity, TopologyType,
    analyze_logs,
};

/// Library-level tests driving the service from request documents the way
/// collectors produce them.

const PROXY_REQUEST: &str = r#"{
    "cluster_name": "billing",
    "topology_type": "master_replica",
    "nodes": [
        {
            "hostname": "db1",
            "role": "master",
            "global_status": {"Uptime": 3600, "Questions": 36000},
            "global_variables": {"max_connections": 200},
            "error_log": "2024-03-01 08:00:00 0 [ERROR] InnoDB: Database page corruption on disk\n"
        },
        {
            "hostname": "db2",
            "role": "replica",
            "global_status": {"Uptime": 3600},
            "slave_status": {
                "Slave_IO_Running": "Yes",
                "Slave_SQL_Running": "Yes",
                "Seconds_Behind_Master": 0
            }
        }
    ],
    "maxscale": {
        "servers": [
            {"name": "db1", "address": "10.0.0.1", "state": "Master, Running"},
            {"name": "db2", "address": "10.0.0.2", "state": "Down"}
        ],
        "logs": {
            "mx1": "2024-03-01 08:00:05   error  : Lost connection, protocol violation\n"
        }
    }
}"#;

fn proxy_request() -> ClusterReviewRequest {
    serde_json::from_str(PROXY_REQUEST).unwrap()
}

#[test]
fn test_maxscale_alias_and_down_server_escalate() {
    let request = proxy_request();
    assert!(request.active_proxy().is_some());

    let response = ReviewService::new().review(&request).unwrap();
    assert_eq!(response.topology_type, TopologyType::MasterReplica);
    assert_eq!(response.overall_status, Severity::Critical);
    assert!(response.overall_summary.ends_with(" (proxy issues detected)"));
    assert!(
        response
            .findings
            .iter()
            .any(|f| f.severity == Severity::Critical)
    );
}

#[test]
fn test_disabled_proxy_is_ignored() {
    let mut request = proxy_request();
    if let Some(proxy) = request.proxy.as_mut() {
        proxy.enabled = false;
    }
    assert!(request.active_proxy().is_none());

    let response = ReviewService::new().review(&request).unwrap();
    assert!(!response.overall_summary.ends_with(" (proxy issues detected)"));
    assert!(!response.key_insights.contains_key("proxy_healthy"));
}

#[test]
fn test_auto_review_detects_replication() {
    let request = proxy_request();
    let response = ReviewService::new().auto_review(&request).unwrap();
    assert_eq!(response.topology_type, TopologyType::MasterReplica);
    assert_eq!(
        response.key_insights.get_bool("topology_auto_detected"),
        Some(true)
    );
}

#[test]
fn test_embedded_logs_are_classified() {
    let input = LogAnalysisInput::from_request(&proxy_request());
    assert_eq!(input.mariadb_logs.len(), 1);
    assert_eq!(input.proxy_logs.len(), 1);
    assert!(input.slow_query_logs.is_empty());

    let result = analyze_logs(&input);
    assert!(result.summary.total_critical_issues >= 1);
    assert_eq!(result.timeline.len(), 1);
    assert_eq!(result.timeline[0].node, "db1");
    assert_eq!(result.timeline[0].kind, EventKind::InnodbCorruption);
    assert_eq!(
        result.proxy_logs["mx1"].summary.protocol_errors.len(),
        1
    );
}

#[test]
fn test_empty_request_is_invalid() {
    let request = ClusterReviewRequest::new("empty", TopologyType::Galera, vec![]);
    let err = ReviewService::new().review(&request).unwrap_err();
    assert!(matches!(err, ReviewError::InvalidRequest(_)));
}
