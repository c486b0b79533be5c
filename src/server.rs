use crate::command::{self, Command};
use crate::config::Config;
use crate::connection::ClientState;
use crate::engine::SharedEngine;
use crate::persistence::SnapshotWriter;
use crate::pubsub::{PubSubReceiver, PubSubSender};
use crate::resp::{RespParser, RespValue};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Bind the configured address and serve until ctrl-c.
pub async fn run_server(engine: SharedEngine, config: Config) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    serve(listener, engine, config).await
}

/// Serve connections from an already bound listener until ctrl-c, then write
/// a final snapshot.
pub async fn serve(
    listener: TcpListener,
    engine: SharedEngine,
    config: Config,
) -> std::io::Result<()> {
    info!("ramkv listening on {}", listener.local_addr()?);

    let sweep_engine = engine.clone();
    let sweep_every = config.sweep_every();
    tokio::spawn(async move {
        sweep_loop(sweep_engine, sweep_every).await;
    });

    let snapshots = SnapshotWriter::new(config.snapshot_path.clone());
    if let Some(every) = config.snapshot_every() {
        let snapshot_engine = engine.clone();
        let writer = snapshots.clone();
        tokio::spawn(async move {
            snapshot_loop(snapshot_engine, writer, every).await;
        });
    }

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                debug!("New connection from {peer_addr}");

                let engine = engine.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, engine).await {
                        debug!("Connection error from {peer_addr}: {e}");
                    }
                    debug!("Connection closed: {peer_addr}");
                });
            }
            _ = tokio::signal::ctrl_c() => {
                let stats = engine.lock().await.stats();
                info!(
                    commands = stats.commands_processed,
                    expired = stats.expired_keys,
                    expired_by_sweep = stats.expired_by_sweep,
                    "Shutting down..."
                );
                if config.snapshot_every().is_some() {
                    save_snapshot(&snapshots, &engine).await;
                }
                return Ok(());
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, engine: SharedEngine) -> std::io::Result<()> {
    let mut client = ClientState::new();
    let (pubsub_tx, pubsub_rx): (PubSubSender, PubSubReceiver) = mpsc::unbounded_channel();

    let result = connection_loop(&mut stream, &engine, &mut client, &pubsub_tx, pubsub_rx).await;
    engine.lock().await.disconnect(client.id);
    result
}

async fn connection_loop(
    stream: &mut TcpStream,
    engine: &SharedEngine,
    client: &mut ClientState,
    pubsub_tx: &PubSubSender,
    mut pubsub_rx: PubSubReceiver,
) -> std::io::Result<()> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        // Drain every complete frame already buffered
        loop {
            let frame = match RespParser::parse(&mut buf) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    let reply = RespValue::error(format!("ERR Protocol error: {e}"));
                    stream.write_all(&reply.serialize()).await?;
                    return Ok(());
                }
            };

            let command = match Command::from_resp(frame) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    stream.write_all(&e.to_resp().serialize()).await?;
                    return Ok(());
                }
            };

            let reply = {
                let mut engine = engine.lock().await;
                engine.refresh_clock();
                command::dispatch(command, &mut engine, client, pubsub_tx)
            };
            stream.write_all(&reply.serialize()).await?;

            if client.should_close {
                return Ok(());
            }
        }

        tokio::select! {
            result = stream.read_buf(&mut buf) => {
                if result? == 0 {
                    return Ok(());
                }
            }
            Some(msg) = pubsub_rx.recv() => {
                stream.write_all(&msg.serialize()).await?;
            }
        }
    }
}

/// Periodically retire every key whose deadline has passed, whether or not
/// anyone reads it.
async fn sweep_loop(engine: SharedEngine, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let mut engine = engine.lock().await;
        engine.refresh_clock();
        let retired = engine.sweep();
        if retired > 0 {
            debug!(retired, remaining = engine.expiry().len(), "expiry sweep");
        }
    }
}

async fn snapshot_loop(engine: SharedEngine, writer: SnapshotWriter, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        save_snapshot(&writer, &engine).await;
    }
}

async fn save_snapshot(writer: &SnapshotWriter, engine: &SharedEngine) {
    match writer.save(engine).await {
        Ok(keys) => info!(keys, "Snapshot saved to {}", writer.path().display()),
        Err(e) => warn!("Failed to save snapshot: {e}"),
    }
}
