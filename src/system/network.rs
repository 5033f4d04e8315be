//! system::network
//!
//! Interfaces, connections, protocol counters and routes.
//!
//! Interfaces come from `ifconfig`, whose block layout is shared by macOS
//! and net-tools on Linux. Traffic counters, connections and protocol
//! statistics come from `netstat`.

use std::collections::BTreeMap;

use crate::shell::Shell;
use crate::ui::output::{Level, Report};

use super::format::format_bytes;

/// Connections listed per protocol in verbose mode.
const CONNECTION_PREVIEW: usize = 10;

/// Routing table lines shown.
const ROUTE_PREVIEW: usize = 5;

/// Protocol counters shown unless verbose.
const IMPORTANT_STATS: &[&str] = &[
    "packets sent",
    "packets received",
    "connections established",
    "connections failed",
    "packets dropped",
    "errors",
];

/// Protocols whose `netstat -s` sections are reported.
const STAT_PROTOCOLS: &[&str] = &["tcp", "udp", "ip"];

/// One network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub flags: Vec<String>,
    pub mtu: Option<u32>,
    pub mac: Option<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

impl Interface {
    pub fn is_up(&self) -> bool {
        self.has_flag("UP")
    }

    pub fn is_loopback(&self) -> bool {
        self.has_flag("LOOPBACK")
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

fn parse_interface_header(line: &str) -> Option<Interface> {
    let (name, rest) = line.split_once(':')?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let flags = rest
        .split_once('<')
        .and_then(|(_, r)| r.split_once('>'))
        .map(|(inner, _)| {
            inner
                .split(',')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let mut words = rest.split_whitespace();
    let mut mtu = None;
    while let Some(word) = words.next() {
        if word == "mtu" {
            mtu = words.next().and_then(|m| m.parse().ok());
        }
    }
    Some(Interface {
        name: name.to_string(),
        flags,
        mtu,
        ..Default::default()
    })
}

/// Parse `ifconfig` output into interfaces.
pub fn parse_ifconfig(output: &str) -> Vec<Interface> {
    let mut interfaces: Vec<Interface> = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            if let Some(iface) = parse_interface_header(line) {
                interfaces.push(iface);
            }
            continue;
        }
        let Some(current) = interfaces.last_mut() else {
            continue;
        };
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("inet"), Some(addr)) => {
                current.ipv4.push(addr.trim_start_matches("addr:").to_string())
            }
            (Some("inet6"), Some(addr)) => {
                let addr = addr.split('%').next().unwrap_or(addr);
                current.ipv6.push(addr.to_string());
            }
            (Some("ether"), Some(mac)) => current.mac = Some(mac.to_string()),
            _ => {}
        }
    }
    interfaces
}

/// Per-interface traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub tx_bytes: u64,
}

/// Counters for `name` from `netstat -i -b`.
///
/// Uses the first row for the interface. Rows without an address column
/// (loopback link rows) have one field fewer.
pub fn parse_interface_stats(output: &str, name: &str) -> Option<InterfaceStats> {
    output.lines().find_map(|line| {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 10 || f[0] != name {
            return None;
        }
        let (ipkts, ibytes, opkts, obytes) = if f.len() >= 11 {
            (4, 6, 7, 9)
        } else {
            (3, 5, 6, 8)
        };
        let n = |i: usize| f[i].parse::<u64>().ok();
        Some(InterfaceStats {
            rx_packets: n(ipkts)?,
            rx_bytes: n(ibytes)?,
            tx_packets: n(opkts)?,
            tx_bytes: n(obytes)?,
        })
    })
}

/// One socket from `netstat -an`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub local: String,
    pub foreign: String,
    pub state: String,
}

/// Summary of one protocol's sockets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub connections: Vec<Connection>,
    pub states: BTreeMap<String, usize>,
}

/// Parse `netstat -an -p <protocol>` output.
///
/// The two header lines are skipped. Rows must start with the protocol
/// name (`tcp4`, `tcp6`, `udp46`, ...). UDP rows have no state column.
pub fn parse_connections(output: &str, protocol: &str) -> ConnectionSummary {
    let mut summary = ConnectionSummary::default();
    for line in output.lines().skip(2) {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 5 || !f[0].to_lowercase().starts_with(protocol) {
            continue;
        }
        let state = f.get(5).copied().unwrap_or("-").to_string();
        *summary.states.entry(state.clone()).or_insert(0) += 1;
        summary.connections.push(Connection {
            local: f[3].to_string(),
            foreign: f[4].to_string(),
            state,
        });
    }
    summary
}

/// Whether a `netstat -s` line is one of the headline counters.
pub fn is_important_stat(line: &str) -> bool {
    let lower = line.to_lowercase();
    IMPORTANT_STATS.iter().any(|k| lower.contains(k))
}

/// Counter lines of `netstat -s` grouped by protocol.
///
/// A section header is a line ending in `:` with no spaces. Only the
/// tcp, udp and ip sections are kept; unless `verbose`, only headline
/// counters within them.
pub fn parse_protocol_stats(output: &str, verbose: bool) -> Vec<(String, Vec<String>)> {
    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<String> = None;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.ends_with(':') && !line.contains(' ') {
            let proto = line.trim_end_matches(':').to_string();
            current = STAT_PROTOCOLS.contains(&proto.as_str()).then(|| {
                sections.push((proto.clone(), Vec::new()));
                proto
            });
            continue;
        }
        if current.is_some() && (verbose || is_important_stat(line)) {
            if let Some((_, lines)) = sections.last_mut() {
                lines.push(line.to_string());
            }
        }
    }
    sections
}

/// Options for the network report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkOptions {
    pub verbose: bool,
    pub connections: bool,
    pub stats: bool,
}

fn render_interface(r: &mut Report, shell: &dyn Shell, iface: &Interface, verbose: bool) {
    let status = if iface.is_up() {
        Level::Ok.paint("UP")
    } else {
        Level::Critical.paint("DOWN")
    };
    r.field("Interface", format!("{} [{}]", iface.name, status));
    if !iface.ipv4.is_empty() {
        r.detail(format!("IPv4: {}", iface.ipv4.join(", ")));
    }
    if verbose && !iface.ipv6.is_empty() {
        r.detail(format!("IPv6: {}", iface.ipv6.join(", ")));
    }
    if let Some(mac) = &iface.mac {
        r.detail(format!("MAC: {}", mac));
    }
    if verbose {
        if let Some(mtu) = iface.mtu {
            r.detail(format!("MTU: {}", mtu));
        }
        r.detail(format!("Flags: {}", iface.flags.join(", ")));
        if let Some(stats) = shell
            .capture("netstat", &["-i", "-b"])
            .and_then(|out| parse_interface_stats(&out, &iface.name))
        {
            r.detail(format!("Packets in: {}", stats.rx_packets));
            r.detail(format!("Packets out: {}", stats.tx_packets));
            r.detail(format!("Bytes in: {}", format_bytes(stats.rx_bytes)));
            r.detail(format!("Bytes out: {}", format_bytes(stats.tx_bytes)));
        }
    }
}

fn render_connections(r: &mut Report, label: &str, summary: &ConnectionSummary, verbose: bool) {
    r.field(label, summary.connections.len());
    if verbose {
        for c in summary.connections.iter().take(CONNECTION_PREVIEW) {
            r.detail(format!("{} -> {} [{}]", c.local, c.foreign, c.state));
        }
    }
    for (state, count) in &summary.states {
        r.detail(format!("{}: {}", state, count));
    }
}

/// Build the network report.
pub fn report(shell: &dyn Shell, opts: NetworkOptions) -> Report {
    let mut r = Report::new();
    r.header("Network");

    r.section("Interfaces");
    match shell.capture("ifconfig", &[]) {
        Some(out) => {
            for iface in parse_ifconfig(&out) {
                render_interface(&mut r, shell, &iface, opts.verbose);
            }
        }
        None => {
            r.line(Level::Critical.paint("  unable to list interfaces"));
        }
    }

    if opts.connections {
        r.section("Connections");
        let mut protocols = vec!["tcp"];
        if opts.verbose {
            protocols.push("udp");
        }
        for proto in protocols {
            if let Some(out) = shell.capture("netstat", &["-an", "-p", proto]) {
                let summary = parse_connections(&out, proto);
                render_connections(&mut r, &proto.to_uppercase(), &summary, opts.verbose);
            }
        }
    }

    if opts.stats {
        r.section("Statistics");
        if let Some(out) = shell.capture("netstat", &["-s"]) {
            for (proto, lines) in parse_protocol_stats(&out, opts.verbose) {
                r.field(&proto.to_uppercase(), "");
                for line in lines {
                    r.detail(line);
                }
            }
        }
    }

    if opts.verbose {
        r.section("Routes");
        if let Some(out) = shell.capture("netstat", &["-rn"]) {
            for line in out.lines().take(ROUTE_PREVIEW).filter(|l| !l.trim().is_empty()) {
                r.line(format!("  {}", line));
            }
            r.detail("run `netstat -rn` for the full table");
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::mock::MockShell;

    const IFCONFIG: &str = "\
lo0: flags=8049<UP,LOOPBACK,RUNNING,MULTICAST> mtu 16384
\toptions=1203<RXCSUM,TXCSUM,TXSTATUS,SW_TIMESTAMP>
\tinet 127.0.0.1 netmask 0xff000000
\tinet6 ::1 prefixlen 128
\tinet6 fe80::1%lo0 prefixlen 64 scopeid 0x1
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a4:83:e7:11:22:33
\tinet 192.168.1.20 netmask 0xffffff00 broadcast 192.168.1.255
utun0: flags=8051<POINTOPOINT,RUNNING,MULTICAST> mtu 1380
";

    const NETSTAT_IB: &str = "\
Name       Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
lo0        16384 <Link#1>                         5000     0     600000     5000     0     600000     0
en0        1500  <Link#6>    a4:83:e7:11:22:33  123456     0  987654321    65432     0    1048576     0
en0        1500  192.168.1     192.168.1.20     120000     -  900000000    60000     -    1000000     -
";

    const NETSTAT_TCP: &str = "\
Active Internet connections (including servers)
Proto Recv-Q Send-Q  Local Address          Foreign Address        (state)
tcp4       0      0  192.168.1.20.50123     17.57.146.20.443       ESTABLISHED
tcp6       0      0  *.22                   *.*                    LISTEN
tcp4       0      0  127.0.0.1.8888         *.*                    LISTEN
udp4       0      0  *.5353                 *.*
";

    #[test]
    fn ifconfig_blocks() {
        let ifaces = parse_ifconfig(IFCONFIG);
        assert_eq!(ifaces.len(), 3);

        let lo = &ifaces[0];
        assert!(lo.is_up() && lo.is_loopback());
        assert_eq!(lo.mtu, Some(16384));
        assert_eq!(lo.ipv4, vec!["127.0.0.1"]);
        assert_eq!(lo.ipv6, vec!["::1", "fe80::1"]);

        let en0 = &ifaces[1];
        assert_eq!(en0.mac.as_deref(), Some("a4:83:e7:11:22:33"));
        assert!(!en0.is_loopback());

        assert!(!ifaces[2].is_up());
    }

    #[test]
    fn interface_counters() {
        let en0 = parse_interface_stats(NETSTAT_IB, "en0").unwrap();
        assert_eq!(en0.rx_packets, 123456);
        assert_eq!(en0.rx_bytes, 987654321);
        assert_eq!(en0.tx_packets, 65432);
        assert_eq!(en0.tx_bytes, 1048576);

        let lo0 = parse_interface_stats(NETSTAT_IB, "lo0").unwrap();
        assert_eq!(lo0.rx_packets, 5000);
        assert_eq!(lo0.tx_bytes, 600000);

        assert_eq!(parse_interface_stats(NETSTAT_IB, "en9"), None);
    }

    #[test]
    fn connection_states() {
        let tcp = parse_connections(NETSTAT_TCP, "tcp");
        assert_eq!(tcp.connections.len(), 3);
        assert_eq!(tcp.states.get("LISTEN"), Some(&2));
        assert_eq!(tcp.states.get("ESTABLISHED"), Some(&1));
        assert_eq!(tcp.connections[0].foreign, "17.57.146.20.443");

        let udp = parse_connections(NETSTAT_TCP, "udp");
        assert_eq!(udp.connections.len(), 1);
        assert_eq!(udp.connections[0].state, "-");
    }

    #[test]
    fn protocol_sections() {
        let out = "\
tcp:
\t1234 packets sent
\t\t10 data packets (2048 bytes)
\t987 packets received
\t3 connections established (including accepts)
icmp:
\t5 calls to icmp_error
ip:
\t42 total packets received
\t0 bad header checksums
";
        let brief = parse_protocol_stats(out, false);
        assert_eq!(brief.len(), 2);
        assert_eq!(brief[0].0, "tcp");
        assert_eq!(brief[0].1.len(), 3);
        assert_eq!(brief[1].1, vec!["42 total packets received"]);

        let full = parse_protocol_stats(out, true);
        assert_eq!(full[0].1.len(), 4);
        assert_eq!(full[1].1.len(), 2);
    }

    #[test]
    fn important_keywords() {
        assert!(is_important_stat("17 Packets Dropped due to full socket buffers"));
        assert!(!is_important_stat("5 window probes"));
    }

    #[test]
    fn report_sections() {
        let shell = MockShell::new()
            .with_stdout("ifconfig", IFCONFIG)
            .with_stdout("netstat -an -p tcp", NETSTAT_TCP);
        let text = report(
            &shell,
            NetworkOptions {
                connections: true,
                ..Default::default()
            },
        )
        .plain();
        assert!(text.contains("Interface: en0 [UP]"));
        assert!(text.contains("Interface: utun0 [DOWN]"));
        assert!(text.contains("IPv4: 192.168.1.20"));
        assert!(!text.contains("IPv6"));
        assert!(text.contains("TCP: 3"));
        assert!(text.contains("LISTEN: 2"));
        assert!(!text.contains("Routes"));
        assert!(!shell.calls().contains(&"netstat -an -p udp".to_string()));
    }

    #[test]
    fn verbose_report_adds_counters_and_routes() {
        let shell = MockShell::new()
            .with_stdout("ifconfig", IFCONFIG)
            .with_stdout("netstat -i -b", NETSTAT_IB)
            .with_stdout(
                "netstat -rn",
                "Routing tables\n\nInternet:\nDestination Gateway Flags Netif\ndefault 192.168.1.1 UGScg en0\n127 127.0.0.1 UCS lo0\n",
            );
        let text = report(
            &shell,
            NetworkOptions {
                verbose: true,
                ..Default::default()
            },
        )
        .plain();
        assert!(text.contains("Bytes out: 1.0 MB"));
        assert!(text.contains("MTU: 1500"));
        assert!(text.contains("  default 192.168.1.1 UGScg en0"));
        assert!(!text.contains("127 127.0.0.1"));
    }
}
