//! QUIC point-cloud streaming server.
//!
//! Streams voxel-filtered, zstd-compressed point-cloud frames to every
//! accepted connection at a bounded rate. One independent session task
//! runs per connection; a session failure never affects the others.
//! Startup problems (bad directory, no frame files, unloadable TLS
//! material, failed bind) log and exit non-zero.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pointstream::session::{self, SessionConfig};
use pointstream::{FrameSource, transport};

#[derive(Parser, Debug)]
#[command(
    name = "pointstream-server",
    version,
    about = "QUIC point-cloud frame streaming server"
)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "localhost:4242")]
    addr: String,

    /// Directory containing .bin point-cloud frame files.
    #[arg(long, default_value = "data")]
    dir: PathBuf,

    /// Target frame rate, frames per second.
    #[arg(long, default_value_t = 10.0)]
    fps: f64,

    /// TLS certificate chain (PEM).
    #[arg(long, default_value = "config/localhost.pem")]
    cert: PathBuf,

    /// TLS private key (PEM).
    #[arg(long, default_value = "config/localhost-key.pem")]
    key: PathBuf,

    /// Voxel leaf size for spatial downsampling.
    #[arg(long, default_value_t = 0.1)]
    leaf_size: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let addr = resolve_addr(&args.addr)?;

    // Surface directory and rate problems before accepting anyone; each
    // session still builds its own source afterwards.
    FrameSource::new(&args.dir, args.fps).context("frame source configuration")?;

    let endpoint = transport::server_endpoint(addr, &args.cert, &args.key)
        .context("starting QUIC endpoint")?;
    info!("QUIC server listening on {addr}");
    info!("reading frames from {} at {} fps", args.dir.display(), args.fps);

    let config = SessionConfig { frame_dir: args.dir, fps: args.fps, leaf_size: args.leaf_size };

    while let Some(incoming) = endpoint.accept().await {
        let config = config.clone();
        tokio::spawn(async move {
            match incoming.await {
                Ok(conn) => session::handle_session(conn, config).await,
                Err(e) => error!("connection handshake failed: {e}"),
            }
        });
    }

    Ok(())
}

fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .with_context(|| format!("invalid listen address {addr}"))?
        .next()
        .with_context(|| format!("listen address {addr} resolved to nothing"))
}
