use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Resolves the machine name to its first IPv4 address.
pub fn resolve_host_ip(host_name: &str) -> Option<Ipv4Addr> {
    if host_name.trim().is_empty() {
        return None;
    }

    match (host_name, 0).to_socket_addrs() {
        Ok(addrs) => addrs.into_iter().find_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        }),
        Err(err) => {
            debug!(host = %host_name, error = %err, "не удалось разрешить имя хоста");
            None
        }
    }
}

/// IPv4 source address the OS picks for outbound traffic towards `target`.
///
/// Connecting a UDP socket only selects a route; no datagram leaves the host.
/// The socket is dropped when this function returns, on success and on error.
pub fn probe_active_ip(target: SocketAddr) -> io::Result<Ipv4Addr> {
    if !target.is_ipv4() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "адрес для проверки маршрута должен быть IPv4",
        ));
    }
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(local) if !local.is_unspecified() => Ok(local),
        _ => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "маршрут не выбрал исходный IPv4-адрес",
        )),
    }
}

pub fn choose_active_ip(probe: io::Result<Ipv4Addr>, resolved_ip: &str) -> String {
    match probe {
        Ok(ip) => ip.to_string(),
        Err(err) => {
            debug!(
                error = %err,
                fallback = %resolved_ip,
                "проверка маршрута не удалась, используется адрес хоста"
            );
            resolved_ip.to_string()
        }
    }
}

/// First interface owning an IPv4 address textually equal to `active_ip`.
pub fn find_active_interface(
    interfaces: &[(String, Vec<IpAddr>)],
    active_ip: &str,
) -> Option<String> {
    if active_ip.is_empty() {
        return None;
    }

    interfaces
        .iter()
        .find(|(_, addrs)| {
            addrs
                .iter()
                .any(|addr| addr.is_ipv4() && addr.to_string() == active_ip)
        })
        .map(|(name, _)| name.clone())
}

/// Active IP (probe result, else `resolved_ip`) and the interface that owns it.
pub fn locate_active(
    probe: io::Result<Ipv4Addr>,
    resolved_ip: &str,
    interfaces: &[(String, Vec<IpAddr>)],
) -> (String, Option<String>) {
    let active_ip = choose_active_ip(probe, resolved_ip);
    let active_interface = find_active_interface(interfaces, &active_ip);
    (active_ip, active_interface)
}
