//! Runtime configuration.
//!
//! Every option is a command line flag that falls back to an environment
//! variable. The binary loads a `.env` file, if one exists, before parsing.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// A JSON CRUD service for an albums collection.
#[derive(Clone, Debug, Parser)]
#[command(name = "album-service", version)]
pub struct Config {
    /// MongoDB connection string.
    #[arg(long, env = "CONNECTION_URL", hide_env_values = true)]
    pub connection_url: String,

    /// The IP address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// The port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Database holding the `albums` collection.
    #[arg(long = "database", env = "DATABASE_NAME", default_value = "music")]
    pub database: String,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
