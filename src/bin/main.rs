use std::net::{SocketAddr, UdpSocket};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forwarder::{serve, Responder, ServerConfig, UpstreamResolver};

#[derive(Parser, Debug)]
#[command(name = "forwarder", version, about = "Minimal UDP DNS responder")]
struct Args {
    /// Upstream resolver to forward questions to (e.g. 8.8.8.8:53)
    #[arg(long, value_name = "ADDR")]
    resolver: Option<SocketAddr>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::default().with_resolver(args.resolver);

    let socket = UdpSocket::bind(config.bind)
        .with_context(|| format!("failed to bind to {}", config.bind))?;
    info!(bind = %config.bind, "listening");

    let resolver = config.resolver.map(|upstream| {
        info!(%upstream, timeout = ?config.lookup_timeout, "forwarding queries");
        UpstreamResolver::new(upstream, config.lookup_timeout)
    });
    let responder = Responder::new(resolver);

    // queries are handled sequentially; only a receive failure ends the loop
    serve(&socket, &responder)?;

    Ok(())
}
