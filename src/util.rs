use std::net::{Ipv4Addr, SocketAddr};

const AGGREGATOR_PORT: &str = "AGGREGATOR_PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(AGGREGATOR_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const AGGREGATOR_ADDR: &str = "AGGREGATOR_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    let addr_from_env = std::env::var(AGGREGATOR_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

/// Listen address from `AGGREGATOR_ADDR`/`AGGREGATOR_PORT`
pub fn get_http_addr() -> SocketAddr {
    SocketAddr::from((get_addr(), get_port()))
}
