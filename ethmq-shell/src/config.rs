use std::time::Duration;

use structopt::StructOpt;

use ethmq::engine::{self, Error};
use ethmq::wire::{Checksum, EthernetAddress, Ipv4Address};

/// Command line of the shell.
///
/// Call example:
///
/// * `ethmq-shell tap0 10.0.0.1 02:03:04:05:06:8a 10.0.0.2 --gateway 10.0.0.2`
#[derive(Clone, Debug, StructOpt)]
pub struct Config {
    /// The tap interface to attach to.
    pub tap: String,
    /// Our IPv4 address.
    pub host: Ipv4Address,
    /// Our hardware address.
    pub hostmac: EthernetAddress,
    /// The address of the MQTT broker.
    pub broker: Ipv4Address,

    /// The subnet mask.
    #[structopt(long, default_value = "255.255.255.0")]
    pub mask: Ipv4Address,
    /// The default gateway.
    #[structopt(long, default_value = "0.0.0.0")]
    pub gateway: Ipv4Address,
    /// The hardware address of the broker, resolved with ARP when omitted.
    #[structopt(long)]
    pub broker_mac: Option<EthernetAddress>,
    /// The port of the broker.
    #[structopt(long, default_value = "1883")]
    pub port: u16,
    /// The MQTT client identifier.
    #[structopt(long, default_value = "hello")]
    pub client_id: String,
    /// Accept TCP segments without verifying their checksum.
    #[structopt(long)]
    pub ignore_checksum: bool,
    /// Milliseconds to wait for a frame between two iterations.
    #[structopt(long, default_value = "10")]
    pub interval: u64,
}

impl Config {
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }

    /// The engine configuration described by the command line.
    pub fn engine(&self) -> Result<engine::Config, Error> {
        let mut client_id = heapless::String::new();
        client_id.push_str(&self.client_id).map_err(|_| Error::TooLong)?;

        Ok(engine::Config {
            hardware_addr: self.hostmac,
            ip_addr: self.host,
            subnet_mask: self.mask,
            gateway: self.gateway,
            peer_hardware_addr: self.broker_mac.unwrap_or(EthernetAddress([0; 6])),
            peer_ip_addr: self.broker,
            peer_port: self.port,
            client_id,
            tcp_checksum: if self.ignore_checksum { Checksum::Ignored } else { Checksum::Manual },
            ..engine::Config::default()
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::from_iter_safe(args.iter().copied()).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["ethmq-shell", "tap0", "10.0.0.1", "02:03:04:05:06:8a", "10.0.0.2"]);
        let engine = config.engine().unwrap();
        assert_eq!(engine.ip_addr, Ipv4Address::new(10, 0, 0, 1));
        assert_eq!(engine.subnet_mask, Ipv4Address::new(255, 255, 255, 0));
        assert_eq!(engine.peer_port, 1883);
        assert_eq!(engine.client_id.as_str(), "hello");
        assert!(engine.peer_hardware_addr.is_unspecified());
        assert_eq!(engine.tcp_checksum, Checksum::Manual);
        assert_eq!(config.interval(), Duration::from_millis(10));
    }

    #[test]
    fn options() {
        let config = parse(&[
            "ethmq-shell", "tap0", "10.0.0.1", "02:03:04:05:06:8a", "192.168.1.2",
            "--gateway", "10.0.0.254", "--broker-mac", "1c:69:7a:07:94:e3",
            "--client-id", "board", "--ignore-checksum",
        ]);
        let engine = config.engine().unwrap();
        assert_eq!(engine.next_hop(), Ipv4Address::new(10, 0, 0, 254));
        assert_eq!(engine.peer_hardware_addr, EthernetAddress([0x1c, 0x69, 0x7a, 0x07, 0x94, 0xe3]));
        assert_eq!(engine.client_id.as_str(), "board");
        assert_eq!(engine.tcp_checksum, Checksum::Ignored);
    }

    #[test]
    fn client_id_too_long() {
        let config = parse(&[
            "ethmq-shell", "tap0", "10.0.0.1", "02:03:04:05:06:8a", "10.0.0.2",
            "--client-id", "a-client-identifier-of-thirty",
        ]);
        assert_eq!(config.engine().unwrap_err(), Error::TooLong);
    }
}
