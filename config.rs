// Server and client configuration
//
// Defaults match the deployed layout: loopback on 22222, backlog 50,
// four connection workers, database at ./data/db.json.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::{ArgAction, Parser};

pub const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 22222;
pub const DEFAULT_BACKLOG: u32 = 50;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_DB_PATH: &str = "./data/db.json";
pub const DEFAULT_CLIENT_DATA_DIR: &str = "./client_data";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub backlog: u32,
    pub workers: usize,
    pub db_path: PathBuf,
    /// Keep an existing database file instead of truncating it
    pub persist: bool,
    /// Log every request and response body
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: DEFAULT_ADDRESS,
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            workers: DEFAULT_WORKERS,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            persist: false,
            debug: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Filter directive used when RUST_LOG is unset
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Directory holding ready-made request files
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            address: DEFAULT_ADDRESS,
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_CLIENT_DATA_DIR),
        }
    }
}

impl ClientConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

/// JSON database server
#[derive(Debug, Parser)]
#[command(name = "jsondb-server", version)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "JSONDB_ADDRESS", default_value_t = DEFAULT_ADDRESS)]
    pub address: IpAddr,

    /// Port to listen on
    #[arg(long, env = "JSONDB_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Listen backlog
    #[arg(long, env = "JSONDB_BACKLOG", default_value_t = DEFAULT_BACKLOG)]
    pub backlog: u32,

    /// Number of concurrent connection workers
    #[arg(long, env = "JSONDB_WORKERS", default_value_t = DEFAULT_WORKERS,
          value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub workers: usize,

    /// Database file
    #[arg(long = "db", env = "JSONDB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Keep the existing database file on startup (true/false)
    #[arg(short = 'p', long, env = "JSONDB_PERSIST", action = ArgAction::Set, default_value_t = false)]
    pub persist: bool,

    /// Debug mode: log request and response bodies (true/false)
    #[arg(short = 'd', long, env = "JSONDB_DEBUG", action = ArgAction::Set, default_value_t = false)]
    pub debug: bool,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        ServerConfig {
            address: args.address,
            port: args.port,
            backlog: args.backlog,
            workers: args.workers,
            db_path: args.db_path,
            persist: args.persist,
            debug: args.debug,
        }
    }
}

/// JSON database client: sends one request and prints the response
#[derive(Debug, Parser)]
#[command(name = "jsondb-client", version)]
pub struct ClientArgs {
    /// Request type: get, set, delete or exit
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Key; a JSON array of strings addresses a nested path
    #[arg(short = 'k', long)]
    pub key: Option<String>,

    /// Value for set
    #[arg(short = 'v', long)]
    pub value: Option<String>,

    /// Send the request stored in this file under the data directory
    #[arg(long = "in", conflicts_with = "kind")]
    pub input: Option<String>,

    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    pub address: IpAddr,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, default_value = DEFAULT_CLIENT_DATA_DIR)]
    pub data_dir: PathBuf,
}

impl ClientArgs {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            address: self.address,
            port: self.port,
            data_dir: self.data_dir.clone(),
        }
    }
}
