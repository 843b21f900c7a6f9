//! Node address derivation from ports and the server address map

use ipnetwork::IpNetwork;
use std::net::IpAddr;
use tracing::{debug, warn};

use crate::compute::{AddressResolver, ComputeResult};
use crate::config::NetworkingOpts;
use crate::types::{NodeAddress, NodeAddressType, Port, Server};

/// Server metadata key carrying an explicit hostname
pub const HOSTNAME_METADATA_KEY: &str = "hostname";

/// Default address resolver.
///
/// Order of the result:
/// 1. fixed IPs of active ports (internal)
/// 2. access IPv4/IPv6 (external)
/// 3. hostname from server metadata
/// 4. the server address map, networks in name order
///
/// then optionally re-sorted by `address_sort_order`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortAddresses;

impl AddressResolver for PortAddresses {
    fn node_addresses(
        &self,
        server: &Server,
        ports: &[Port],
        opts: &NetworkingOpts,
    ) -> ComputeResult<Vec<NodeAddress>> {
        Ok(node_addresses(server, ports, opts))
    }
}

/// Anything that does not parse as an IP is treated as IPv6, so it is
/// dropped along with real IPv6 addresses when IPv6 is disabled.
fn is_ipv6(address: &str) -> bool {
    address
        .parse::<IpAddr>()
        .map(|ip| ip.is_ipv6())
        .unwrap_or(true)
}

fn add_address(addrs: &mut Vec<NodeAddress>, address: NodeAddress) {
    if !addrs.contains(&address) {
        addrs.push(address);
    }
}

fn remove_address(addrs: &mut Vec<NodeAddress>, address: &str) {
    addrs.retain(|a| a.address != address);
}

/// Derive the ordered address list for a server
pub fn node_addresses(server: &Server, ports: &[Port], opts: &NetworkingOpts) -> Vec<NodeAddress> {
    let mut addrs = Vec::new();
    let skip_v6 = |address: &str| opts.ipv6_support_disabled && is_ipv6(address);

    for port in ports.iter().filter(|p| p.is_active()) {
        for fixed in &port.fixed_ips {
            if !skip_v6(fixed.ip_address.as_str()) {
                add_address(&mut addrs, NodeAddress::internal(&fixed.ip_address));
            }
        }
    }

    if !server.access_ipv4.is_empty() {
        add_address(&mut addrs, NodeAddress::external(&server.access_ipv4));
    }
    if !server.access_ipv6.is_empty() && !opts.ipv6_support_disabled {
        add_address(&mut addrs, NodeAddress::external(&server.access_ipv6));
    }

    if let Some(hostname) = server
        .metadata
        .get(HOSTNAME_METADATA_KEY)
        .filter(|h| !h.is_empty())
    {
        add_address(
            &mut addrs,
            NodeAddress::new(NodeAddressType::Hostname, hostname),
        );
    }

    // BTreeMap iterates networks in name order
    for (network, entries) in &server.addresses {
        let is_public = opts.public_network_names.iter().any(|n| n == network);
        let is_internal = opts.internal_network_names.is_empty()
            || opts.internal_network_names.iter().any(|n| n == network);

        for entry in entries {
            let kind = if entry.is_floating() {
                NodeAddressType::ExternalIp
            } else if is_public {
                // a network configured as public may already have been
                // reported as internal through its port
                remove_address(&mut addrs, &entry.addr);
                NodeAddressType::ExternalIp
            } else if is_internal {
                NodeAddressType::InternalIp
            } else {
                debug!(
                    server = %server.name,
                    address = %entry.addr,
                    network = %network,
                    "address ignored, network is not an internal network"
                );
                remove_address(&mut addrs, &entry.addr);
                continue;
            };

            if !skip_v6(entry.addr.as_str()) {
                add_address(&mut addrs, NodeAddress::new(kind, &entry.addr));
            }
        }
    }

    if let Some(order) = opts.address_sort_order.as_deref().filter(|o| !o.is_empty()) {
        sort_node_addresses(&mut addrs, order);
    }

    addrs
}

fn parse_sort_order(order: &str) -> Vec<IpNetwork> {
    order
        .split(',')
        .map(str::trim)
        .filter(|cidr| !cidr.is_empty())
        .filter_map(|cidr| match cidr.parse::<IpNetwork>() {
            Ok(net) => Some(net),
            Err(e) => {
                warn!(cidr, error = %e, "ignoring invalid CIDR in address sort order");
                None
            }
        })
        .collect()
}

/// Stable sort by the first CIDR in `order` containing each address.
/// Addresses outside every CIDR, and hostnames, go last.
pub fn sort_node_addresses(addrs: &mut [NodeAddress], order: &str) {
    let networks = parse_sort_order(order);
    if networks.is_empty() {
        return;
    }

    let rank = |address: &NodeAddress| -> usize {
        address
            .address
            .parse::<IpAddr>()
            .ok()
            .and_then(|ip| networks.iter().position(|net| net.contains(ip)))
            .unwrap_or(networks.len())
    };

    addrs.sort_by_key(rank);
}
