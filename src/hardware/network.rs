//! Network interfaces.

use serde::Serialize;
use sysinfo::Networks;

use super::error::HalResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NetworkIf {
    pub name: String,
    pub mac: String,
    /// Addresses in CIDR notation, e.g. `192.168.1.4/24`.
    pub addresses: Vec<String>,
    pub bytes_recv: u64,
    pub bytes_sent: u64,
    pub packets_recv: u64,
    pub packets_sent: u64,
    pub in_errors: u64,
    pub out_errors: u64,
}

/// Enumerates interfaces through sysinfo. Interfaces are sorted by name since sysinfo keeps
/// them in a map.
pub(crate) fn sysinfo_network_ifs() -> HalResult<Vec<NetworkIf>> {
    let networks = Networks::new_with_refreshed_list();

    let mut interfaces = networks
        .list()
        .iter()
        .map(|(name, data)| NetworkIf {
            name: name.clone(),
            mac: data.mac_address().to_string(),
            addresses: data
                .ip_networks()
                .iter()
                .map(|network| format!("{}/{}", network.addr, network.prefix))
                .collect(),
            bytes_recv: data.total_received(),
            bytes_sent: data.total_transmitted(),
            packets_recv: data.total_packets_received(),
            packets_sent: data.total_packets_transmitted(),
            in_errors: data.total_errors_on_received(),
            out_errors: data.total_errors_on_transmitted(),
        })
        .collect::<Vec<_>>();

    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}
