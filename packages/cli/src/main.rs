use anyhow::Result;
use bytes::BytesMut;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use wavez_driver::Controller;
use wavez_serial::binding::{escape, SerialBinding, SerialPortBinding, BREAK_REQUEST, ESCAPE};

#[derive(Parser)]
#[command(name = "wavez", about = "Z-Wave serial controller driver")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Connect to a controller and print the node update stream
    Monitor {
        /// Serial device path, or host:port of a serial bridge
        device: String,
    },
    /// Serve a local serial device to one remote client at a time
    Bridge {
        #[arg(long)]
        port: u16,
        #[arg(long)]
        device: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Cmd::Monitor { device } => monitor(&device).await,
        Cmd::Bridge { port, device } => bridge(port, &device).await,
    }
}

async fn monitor(device: &str) -> Result<()> {
    let controller = Controller::connect(device).await?;
    info!(
        "connected: home id {:?}, controller node {}, library {:?} {:?}",
        controller.home_id(),
        controller.controller_node_id(),
        controller.library_type(),
        controller.library_version(),
    );
    info!("nodes: {:?}", controller.node_ids());

    loop {
        let event = controller.next_event().await;
        println!("{event:?}");
    }
}

async fn bridge(port: u16, device: &str) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("serving {device} on port {port}");
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("client {addr} connected");
        if let Err(e) = serve_client(stream, device).await {
            warn!("client session ended: {e}");
        }
    }
}

/// Shovels bytes between one TCP client and the serial device. Escapes are
/// resolved on the way in; a bare 0x11 from the client requests a line
/// break. Device bytes are escaped on the way out.
async fn serve_client(stream: TcpStream, device: &str) -> Result<()> {
    let mut port = SerialPortBinding::open(device)?;
    let (mut reader, mut writer) = stream.into_split();
    let mut pending_escape = false;
    let mut buf = vec![0u8; 1024];

    loop {
        tokio::select! {
            n = reader.read(&mut buf) => {
                let n = n?;
                if n == 0 {
                    break;
                }
                let mut data = BytesMut::new();
                for &b in &buf[..n] {
                    if pending_escape {
                        pending_escape = false;
                        match b {
                            0x00 => data.extend_from_slice(&[ESCAPE]),
                            0x01 => data.extend_from_slice(&[BREAK_REQUEST]),
                            other => data.extend_from_slice(&[ESCAPE, other]),
                        }
                    } else if b == ESCAPE {
                        pending_escape = true;
                    } else if b == BREAK_REQUEST {
                        if !data.is_empty() {
                            port.send(data.split().freeze()).await?;
                        }
                        port.send_break().await?;
                    } else {
                        data.extend_from_slice(&[b]);
                    }
                }
                if !data.is_empty() {
                    port.send(data.freeze()).await?;
                }
            }
            chunk = port.recv() => {
                let chunk = chunk?;
                if chunk.is_empty() {
                    break;
                }
                writer.write_all(&escape(&chunk)).await?;
            }
        }
    }

    port.close().await?;
    Ok(())
}
