use anyhow::{anyhow, bail, Result};
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::debug;

/// One address bound to a local interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub addr: IpAddr,
    pub netmask: IpAddr,
    pub prefix_len: u8,
    pub is_loopback: bool,
}

/// Enumerate local interface addresses in the order the OS reports them.
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let mut out = Vec::new();
    for iface in get_if_addrs()? {
        let is_loopback = iface.is_loopback();
        let (addr, netmask, prefix_len) = match &iface.addr {
            IfAddr::V4(v4) => (IpAddr::V4(v4.ip), IpAddr::V4(v4.netmask), v4.prefixlen),
            IfAddr::V6(v6) => (IpAddr::V6(v6.ip), IpAddr::V6(v6.netmask), v6.prefixlen),
        };
        out.push(InterfaceInfo {
            name: iface.name,
            addr,
            netmask,
            prefix_len,
            is_loopback,
        });
    }
    Ok(out)
}

/// Sort for display: by interface name, then address.
pub fn sort_for_display(ifaces: &mut [InterfaceInfo]) {
    ifaces.sort_by(|a, b| a.name.cmp(&b.name).then(a.addr.cmp(&b.addr)));
}

/// First non-loopback IPv4 address among `ifaces`, in their given order.
pub fn first_non_loopback_ipv4(ifaces: &[InterfaceInfo]) -> Option<Ipv4Addr> {
    ifaces.iter().find_map(|i| match i.addr {
        IpAddr::V4(v4) if !i.is_loopback && !v4.is_loopback() => Some(v4),
        _ => None,
    })
}

/// Detect this host's LAN IPv4 address.
///
/// Uses the source address of the default route (a UDP `connect` sends no
/// packet). Without a route, falls back to the first non-loopback IPv4 in
/// OS interface order; bridges like `docker0` must not win by name.
pub fn detect_local_ipv4() -> Result<Ipv4Addr> {
    if let Some(ip) = route_probe_ipv4() {
        return Ok(ip);
    }
    debug!("no default route, falling back to interface order");
    match list_interfaces() {
        Ok(ifaces) => first_non_loopback_ipv4(&ifaces)
            .ok_or_else(|| anyhow!("no connected network interface found")),
        Err(e) => Err(e.context("no connected network interface found")),
    }
}

fn route_probe_ipv4() -> Option<Ipv4Addr> {
    let udp = UdpSocket::bind("0.0.0.0:0").ok()?;
    udp.connect("8.8.8.8:80").ok()?;
    match udp.local_addr().ok()?.ip() {
        IpAddr::V4(v4) if !v4.is_unspecified() && !v4.is_loopback() => Some(v4),
        _ => None,
    }
}

/// Helper: convert an IPv4 address into its default /24 network.
pub fn ipv4_to_default_cidr(ip: Ipv4Addr) -> Ipv4Net {
    let o = ip.octets();
    let net = Ipv4Addr::new(o[0], o[1], o[2], 0);
    Ipv4Net::new(net, 24).expect("/24 is always valid")
}

/// Guess the gateway as the `.1` host of the address's /24.
///
/// `192.168.1.42` becomes `192.168.1.1`.
pub fn guess_gateway(local: Ipv4Addr) -> Ipv4Addr {
    let network = u32::from(ipv4_to_default_cidr(local).network());
    Ipv4Addr::from(network + 1)
}

/// String form of [`guess_gateway`]; rejects anything but a dotted quad.
pub fn guess_gateway_str(local: &str) -> Result<Ipv4Addr> {
    match local.trim().parse::<Ipv4Addr>() {
        Ok(ip) => Ok(guess_gateway(ip)),
        Err(_) => bail!("invalid local IP format: {local}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn iface(name: &str, addr: IpAddr, is_loopback: bool) -> InterfaceInfo {
        InterfaceInfo {
            name: name.to_string(),
            addr,
            netmask: addr,
            prefix_len: 24,
            is_loopback,
        }
    }

    #[test]
    fn default_cidr_from_ipv4() {
        let cidr = ipv4_to_default_cidr(Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(cidr.to_string(), "10.1.2.0/24");
    }

    #[test]
    fn gateway_is_dot_one() {
        assert_eq!(
            guess_gateway(Ipv4Addr::new(192, 168, 1, 42)),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert_eq!(
            guess_gateway(Ipv4Addr::new(10, 0, 7, 1)),
            Ipv4Addr::new(10, 0, 7, 1)
        );
    }

    #[test]
    fn gateway_from_bad_string_errors() {
        assert!(guess_gateway_str("192.168.1").is_err());
        assert!(guess_gateway_str("fe80::1").is_err());
    }

    #[test]
    fn picks_first_non_loopback_v4() {
        let ifaces = vec![
            iface("lo", IpAddr::V4(Ipv4Addr::LOCALHOST), true),
            iface("eth0", IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)), false),
            iface("eth0", IpAddr::V4(Ipv4Addr::new(192, 168, 0, 20)), false),
            iface("wlan0", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), false),
        ];
        assert_eq!(
            first_non_loopback_ipv4(&ifaces),
            Some(Ipv4Addr::new(192, 168, 0, 20))
        );
    }

    #[test]
    fn bridge_listed_after_lan_does_not_win() {
        let mut ifaces = vec![
            iface("lo", IpAddr::V4(Ipv4Addr::LOCALHOST), true),
            iface("eth0", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42)), false),
            iface("docker0", IpAddr::V4(Ipv4Addr::new(172, 17, 0, 1)), false),
        ];
        let local = first_non_loopback_ipv4(&ifaces).expect("lan address");
        assert_eq!(guess_gateway(local), Ipv4Addr::new(192, 168, 1, 1));

        // Display order puts docker0 first, detection order must not change.
        sort_for_display(&mut ifaces);
        assert_eq!(ifaces[0].name, "docker0");
    }

    #[test]
    fn none_when_only_loopback() {
        let ifaces = vec![iface("lo", IpAddr::V4(Ipv4Addr::LOCALHOST), true)];
        assert_eq!(first_non_loopback_ipv4(&ifaces), None);
    }
}
