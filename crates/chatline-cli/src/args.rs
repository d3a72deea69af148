//! Command-line arguments.

use std::time::Duration;

use chatline::prelude::*;
use chatline::DEFAULT_PORT;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "chatline", version)]
#[command(about = "Chat client for the IPK25-CHAT protocol over TCP or UDP")]
pub struct Args {
    /// Transport protocol [tcp|udp]
    #[arg(short = 't', value_name = "tcp|udp")]
    pub transport: TransportKind,

    /// Domain name or IP address of the server
    #[arg(short = 's', value_name = "HOST")]
    pub server: String,

    /// Server port
    #[arg(short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// UDP confirmation timeout in milliseconds
    #[arg(short = 'd', value_name = "MS", default_value_t = 250)]
    pub confirm_timeout_ms: u16,

    /// Maximum number of UDP retransmissions
    #[arg(short = 'r', default_value_t = 3)]
    pub retransmissions: u8,

    /// Prefix channel IDs with `discord.` when joining
    #[arg(long)]
    pub discord: bool,

    /// How long to wait for the reply to /auth or /join, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub reply_timeout_ms: u64,

    /// Keep going when a UDP message is never confirmed, instead of
    /// ending the session
    #[arg(long)]
    pub drop_undelivered: bool,
}

impl Args {
    pub fn to_config(&self) -> ClientConfig {
        ClientConfig {
            port: self.port,
            confirm_timeout: Duration::from_millis(u64::from(self.confirm_timeout_ms)),
            max_retransmissions: u32::from(self.retransmissions),
            discord: self.discord,
            reply_timeout: Duration::from_millis(self.reply_timeout_ms),
            timeout_policy: if self.drop_undelivered {
                TimeoutPolicy::DropMessage
            } else {
                TimeoutPolicy::EndSession
            },
            ..ClientConfig::new(self.transport, self.server.clone())
        }
    }
}
