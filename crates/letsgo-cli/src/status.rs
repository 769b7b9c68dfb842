//! # System Status
//!
//! CPU count, uptime and primary IP address for `/status`.

use std::net::{IpAddr, ToSocketAddrs, UdpSocket};
use sysinfo::System;

pub fn status_report() -> String {
    format!(
        "CPU cores: {}\nUptime: {}s\nIP: {}",
        cpu_cores(),
        uptime(),
        first_ip()
    )
}

fn cpu_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Seconds since boot, as the kernel reports them when available
fn uptime() -> String {
    std::fs::read_to_string("/proc/uptime")
        .ok()
        .and_then(|content| content.split_whitespace().next().map(str::to_string))
        .unwrap_or_else(|| format!("{:.2}", System::uptime() as f64))
}

/// First non-loopback address, or `unknown`
pub fn first_ip() -> String {
    route_ip()
        .or_else(host_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Source address the kernel would route external traffic through.
/// Connecting a UDP socket sends no packets.
fn route_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

fn host_ip() -> Option<IpAddr> {
    let host = System::host_name()?;
    (host.as_str(), 0)
        .to_socket_addrs()
        .ok()?
        .map(|addr| addr.ip())
        .find(|ip| ip.is_ipv4() && !ip.is_loopback())
}
