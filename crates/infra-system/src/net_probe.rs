// Network interface probe
// reason: nix getifaddrs, no need to shell out to `ip addr`
use std::net::Ipv4Addr;

/// Longest interface name the kernel accepts (IFNAMSIZ - 1)
const MAX_IFNAME_LEN: usize = 15;

/// First IPv4 address bound to interface `name`
///
/// Returns None when the interface does not exist, has no IPv4 address, or
/// the lookup itself fails.
#[cfg(unix)]
pub fn interface_ipv4(name: &str) -> Option<Ipv4Addr> {
    use nix::ifaddrs::getifaddrs;
    use std::net::SocketAddrV4;
    use tracing::debug;

    let name = truncate_ifname(name);

    let addrs = match getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!(interface = %name, error = %e, "getifaddrs failed");
            return None;
        }
    };

    addrs
        .filter(|ifa| ifa.interface_name == name)
        .find_map(|ifa| {
            ifa.address
                .as_ref()
                .and_then(|addr| addr.as_sockaddr_in())
                .map(|sin| *SocketAddrV4::from(*sin).ip())
        })
}

#[cfg(not(unix))]
pub fn interface_ipv4(_name: &str) -> Option<Ipv4Addr> {
    None
}

/// Text form used by the CLI: the address, or `none`
pub fn format_ipv4(addr: Option<Ipv4Addr>) -> String {
    addr.map(|ip| ip.to_string())
        .unwrap_or_else(|| penguin_bridge_core::application::constants::SENTINEL_VALUE.to_string())
}

fn truncate_ifname(name: &str) -> &str {
    if name.len() <= MAX_IFNAME_LEN {
        return name;
    }
    let mut end = MAX_IFNAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
