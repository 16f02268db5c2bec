use gateway_probe::ports::{parse_ports_str, probe_ports};
use gateway_probe::types::ProbeTarget;
use std::net::{IpAddr, Ipv4Addr};

#[test]
fn parse_single_and_ranges_and_comments() {
    let input = r#"
        # gateway services
        22
        80  # http
        443 # https
        8000-8002
        8001  # duplicate
        # blank line follows

    "#;

    let ports = parse_ports_str(input).expect("parse ok");
    assert_eq!(ports, vec![22, 80, 443, 8000, 8001, 8002]);
}

#[test]
fn invalid_port_rejected() {
    assert!(parse_ports_str("0\n").is_err());
}

#[test]
fn default_target_uses_fixed_list() {
    let target = ProbeTarget::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
    assert_eq!(target.ports(), probe_ports().as_slice());
    assert_eq!(target.ports(), &[80, 443, 23, 22, 8080]);
}

#[test]
fn custom_target_drops_duplicates() {
    let target = ProbeTarget::with_ports(IpAddr::V4(Ipv4Addr::LOCALHOST), &[22, 80, 22, 443, 80]);
    assert_eq!(target.ports(), &[22, 80, 443]);
}
