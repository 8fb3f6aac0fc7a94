use std::net::{IpAddr, Ipv4Addr};

use m13_engine::ServerConfig;
use tracing::info;

#[test]
fn test_default_config() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let config = ServerConfig::default();

    assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.port, 8080);
    assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
}

#[test]
fn test_config_with_custom_values() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let config = ServerConfig::default().with_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED)).with_port(9000);

    assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
}

#[test]
fn test_config_from_partial_document() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let config: ServerConfig = serde_json::from_value(serde_json::json!({"port": 7001})).unwrap();

    assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.port, 7001);
}
