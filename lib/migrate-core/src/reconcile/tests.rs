//! Whole-pass reconciliation tests over the in-memory control plane.

use super::*;
use crate::memory::{CloudExport, FloatingPool, InMemoryCloud, Tenant};
use crate::snapshot::SnapshotReader;
use crate::testutil::{
    floating_ip_data, network_data, placeholder_rule, router_data, router_port,
    security_group_data, subnet_data, tcp_rule,
};
use crate::MigrateError;
use migrate_api::native::{
    ExternalGatewayInfo, LbMemberData, LbMonitorData, LbPoolData, LbVipData,
};

fn tenant(id: &str, name: &str) -> Tenant {
    Tenant {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// One tenant's full topology: an internal network with a subnet, an
/// external network, a gatewayed router, a floating IP, security groups,
/// and a load-balancer chain.
fn source_export() -> CloudExport {
    let mut app_sub = subnet_data("sub-app", "app-sub", "net-app", "src-t", "10.0.0.0/24");
    app_sub.gateway_ip = Some("10.0.0.1".to_string());

    let mut router = router_data("rtr-1", "edge", "src-t");
    router.external_gateway_info = Some(ExternalGatewayInfo {
        network_id: "net-ext".to_string(),
    });

    let mut default_group = security_group_data("sg-def", "default", "src-t");
    default_group
        .security_group_rules
        .push(placeholder_rule("rule-p", "sg-def", "src-t"));
    let mut web_group = security_group_data("sg-web", "web", "src-t");
    web_group
        .security_group_rules
        .push(tcp_rule("rule-443", "sg-web", "src-t", 443));

    CloudExport {
        tenants: vec![tenant("src-t", "admin")],
        networks: vec![
            network_data("net-app", "app", "src-t", false),
            network_data("net-ext", "public", "src-t", true),
        ],
        subnets: vec![
            app_sub,
            subnet_data("sub-ext", "public-sub", "net-ext", "src-t", "203.0.113.0/29"),
        ],
        routers: vec![router],
        ports: vec![router_port("port-1", "rtr-1", "net-app", "sub-app", "10.0.0.1")],
        floating_ips: vec![floating_ip_data("fip-1", "src-t", "net-ext", "203.0.113.5")],
        security_groups: vec![default_group, web_group],
        lb_pools: vec![LbPoolData {
            id: "pool-1".to_string(),
            name: "web-pool".to_string(),
            tenant_id: "src-t".to_string(),
            subnet_id: "sub-app".to_string(),
            protocol: "HTTP".to_string(),
            lb_method: "ROUND_ROBIN".to_string(),
            provider: Some("haproxy".to_string()),
            health_monitors: vec!["mon-1".to_string()],
        }],
        lb_monitors: vec![LbMonitorData {
            id: "mon-1".to_string(),
            tenant_id: "src-t".to_string(),
            monitor_type: "HTTP".to_string(),
            delay: 5,
            timeout: 5,
            max_retries: 3,
        }],
        lb_members: vec![LbMemberData {
            id: "mem-1".to_string(),
            tenant_id: "src-t".to_string(),
            pool_id: "pool-1".to_string(),
            address: "10.0.0.10".to_string(),
            protocol_port: 443,
            weight: 1,
        }],
        lb_vips: vec![LbVipData {
            id: "vip-1".to_string(),
            name: "web-vip".to_string(),
            tenant_id: "src-t".to_string(),
            pool_id: "pool-1".to_string(),
            subnet_id: "sub-app".to_string(),
            address: "10.0.0.100".to_string(),
            protocol: "HTTP".to_string(),
            protocol_port: 443,
        }],
        ..Default::default()
    }
}

/// An empty destination that already carries the unavoidable furniture:
/// the same tenants, a twin of the external network with its floating
/// pool, and the provider-seeded default security group.
fn destination_export() -> CloudExport {
    let mut default_group = security_group_data("d-sg-def", "default", "dst-t");
    default_group
        .security_group_rules
        .push(placeholder_rule("d-rule-p", "d-sg-def", "dst-t"));

    CloudExport {
        tenants: vec![tenant("dst-t", "admin")],
        networks: vec![network_data("d-ext", "public", "dst-t", true)],
        security_groups: vec![default_group],
        floating_pools: vec![FloatingPool {
            network_id: "d-ext".to_string(),
            cidr: "203.0.113.0/29".to_string(),
        }],
        ..Default::default()
    }
}

fn full_config() -> MigrationConfig {
    MigrationConfig {
        keep_lbaas: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_run_builds_destination_topology() {
    let source = InMemoryCloud::new(source_export());
    let dest = InMemoryCloud::new(destination_export());
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = full_config();

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let summary = Reconciler::new(&dst_handle, &config)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(summary.networks.created_count(), 1);
    assert_eq!(summary.networks.skipped, 1);
    assert_eq!(summary.subnets.created_count(), 2);
    assert_eq!(summary.routers.created_count(), 1);
    // the claimed address already belongs to the right tenant
    assert_eq!(summary.floating_ips.created_count(), 0);
    assert_eq!(summary.floating_ips.skipped, 1);
    assert_eq!(summary.security_groups.created_count(), 1);
    assert_eq!(summary.security_groups.skipped, 1);
    assert_eq!(summary.security_group_rules.created_count(), 1);
    assert_eq!(summary.lb_pools.created_count(), 1);
    assert_eq!(summary.lb_monitors.created_count(), 1);
    assert_eq!(summary.lb_associations.created_count(), 1);
    assert_eq!(summary.lb_members.created_count(), 1);
    assert_eq!(summary.lb_vips.created_count(), 1);

    let state = dest.export().await;

    // created records carry destination tenant ids and destination FKs
    let app = state.networks.iter().find(|n| n.name == "app").unwrap();
    assert_eq!(app.tenant_id, "dst-t");
    let app_sub = state.subnets.iter().find(|s| s.name == "app-sub").unwrap();
    assert_eq!(app_sub.network_id, app.id);

    let router = &state.routers[0];
    assert_eq!(
        router.external_gateway_info.as_ref().unwrap().network_id,
        "d-ext"
    );
    assert!(state.ports.iter().any(|p| p.device_id == router.id));

    // saturation and prune leave exactly the claimed address
    assert_eq!(state.floating_ips.len(), 1);
    assert_eq!(state.floating_ips[0].floating_ip_address, "203.0.113.5");
    assert_eq!(state.floating_ips[0].tenant_id, "dst-t");

    let web = state
        .security_groups
        .iter()
        .find(|g| g.name == "web")
        .unwrap();
    assert_eq!(web.security_group_rules.len(), 1);
    assert_eq!(
        web.security_group_rules[0].protocol.as_deref(),
        Some("tcp")
    );

    let pool = &state.lb_pools[0];
    assert_eq!(pool.subnet_id, app_sub.id);
    assert_eq!(pool.health_monitors, vec![state.lb_monitors[0].id.clone()]);
    assert_eq!(state.lb_members[0].pool_id, pool.id);
    assert_eq!(state.lb_vips[0].subnet_id, app_sub.id);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let source = InMemoryCloud::new(source_export());
    let dest = InMemoryCloud::new(destination_export());
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = full_config();

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let reconciler = Reconciler::new(&dst_handle, &config);
    reconciler.run(&snapshot).await.unwrap();

    let before = dest.export().await;
    let summary = reconciler.run(&snapshot).await.unwrap();
    let after = dest.export().await;

    assert_eq!(summary.total_created(), 0);
    assert_eq!(after.networks.len(), before.networks.len());
    assert_eq!(after.subnets.len(), before.subnets.len());
    assert_eq!(after.routers.len(), before.routers.len());
    assert_eq!(after.floating_ips.len(), before.floating_ips.len());
    assert_eq!(after.security_groups.len(), before.security_groups.len());
    assert_eq!(after.lb_pools.len(), before.lb_pools.len());
}

/// Destination fixture for the router tie-break: a twin network, a twin
/// subnet, and a router that hashes identically to the source's.
fn router_twin_destination(port_ip: &str) -> CloudExport {
    let mut twin_sub = subnet_data("d-sub", "app-sub", "d-net", "dst-t", "10.0.0.0/24");
    twin_sub.gateway_ip = Some("10.0.0.1".to_string());
    CloudExport {
        tenants: vec![tenant("dst-t", "admin")],
        networks: vec![network_data("d-net", "app", "dst-t", false)],
        subnets: vec![twin_sub],
        routers: vec![router_data("d-rtr", "edge", "dst-t")],
        ports: vec![router_port("d-port", "d-rtr", "d-net", "d-sub", port_ip)],
        ..Default::default()
    }
}

fn router_only_source() -> CloudExport {
    let mut app_sub = subnet_data("sub-app", "app-sub", "net-app", "src-t", "10.0.0.0/24");
    app_sub.gateway_ip = Some("10.0.0.1".to_string());
    CloudExport {
        tenants: vec![tenant("src-t", "admin")],
        networks: vec![network_data("net-app", "app", "src-t", false)],
        subnets: vec![app_sub],
        routers: vec![router_data("rtr-1", "edge", "src-t")],
        ports: vec![router_port("port-1", "rtr-1", "net-app", "sub-app", "10.0.0.1")],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_same_identity_router_with_shared_addresses_is_skipped() {
    let source = InMemoryCloud::new(router_only_source());
    let dest = InMemoryCloud::new(router_twin_destination("10.0.0.1"));
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = MigrationConfig {
        keep_floatingip: false,
        ..Default::default()
    };

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let summary = Reconciler::new(&dst_handle, &config)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(summary.routers.created_count(), 0);
    assert_eq!(summary.routers.skipped, 1);
    assert_eq!(dest.export().await.routers.len(), 1);
}

#[tokio::test]
async fn test_same_identity_router_with_disjoint_addresses_is_created() {
    let source = InMemoryCloud::new(router_only_source());
    // same name, routes, and tenant, but bound elsewhere in the subnet
    let dest = InMemoryCloud::new(router_twin_destination("10.0.0.9"));
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = MigrationConfig {
        keep_floatingip: false,
        ..Default::default()
    };

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let summary = Reconciler::new(&dst_handle, &config)
        .run(&snapshot)
        .await
        .unwrap();

    assert_eq!(summary.routers.created_count(), 1);
    let state = dest.export().await;
    assert_eq!(
        state.routers.iter().filter(|r| r.name == "edge").count(),
        2
    );
}

#[tokio::test]
async fn test_group_scoped_rule_points_at_destination_peer() {
    let mut web = security_group_data("sg-web", "web", "src-t");
    let mut intra = tcp_rule("rule-1", "sg-web", "src-t", 5432);
    intra.remote_ip_prefix = None;
    intra.remote_group_id = Some("sg-db".to_string());
    web.security_group_rules.push(intra);
    let db = security_group_data("sg-db", "db", "src-t");

    let source = InMemoryCloud::new(CloudExport {
        tenants: vec![tenant("src-t", "admin")],
        security_groups: vec![web, db],
        ..Default::default()
    });
    let dest = InMemoryCloud::new(CloudExport {
        tenants: vec![tenant("dst-t", "admin")],
        ..Default::default()
    });
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = MigrationConfig {
        keep_floatingip: false,
        ..Default::default()
    };

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let summary = Reconciler::new(&dst_handle, &config)
        .run(&snapshot)
        .await
        .unwrap();
    assert_eq!(summary.security_groups.created_count(), 2);
    assert_eq!(summary.security_group_rules.created_count(), 1);

    let state = dest.export().await;
    let dst_db = state
        .security_groups
        .iter()
        .find(|g| g.name == "db")
        .unwrap();
    let dst_web = state
        .security_groups
        .iter()
        .find(|g| g.name == "web")
        .unwrap();
    assert_eq!(
        dst_web.security_group_rules[0].remote_group_id.as_deref(),
        Some(dst_db.id.as_str())
    );
}

#[tokio::test]
async fn test_missing_destination_tenant_fails_in_network_pass() {
    let source = InMemoryCloud::new(CloudExport {
        tenants: vec![tenant("src-t", "admin")],
        networks: vec![network_data("net-app", "app", "src-t", false)],
        ..Default::default()
    });
    let dest = InMemoryCloud::new(CloudExport::default());
    let src_handle = source.handle();
    let dst_handle = dest.handle();
    let config = MigrationConfig::default();

    let snapshot = SnapshotReader::new(&src_handle, &config)
        .read()
        .await
        .unwrap();
    let err = Reconciler::new(&dst_handle, &config)
        .run(&snapshot)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Reconcile {
            kind: ResourceKind::Network,
            ..
        }
    ));
}
