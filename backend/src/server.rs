//! Request/reply loop of the ledger service.
//!
//! THE PROTOCOL HAS NO AUTHENTICATION AND NO TRANSPORT ENCRYPTION: any
//! component on the network path can read or forge ledger mutations. Bind it
//! to a trusted network only.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use common::message::{ErrorKind, ErrorResponse, Response};
use common::wire::{self, WireError};
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::ledger::Ledger;

pub async fn serve(listener: TcpListener, ledger: Arc<Mutex<Ledger>>) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {e}");
                continue;
            }
        };

        info!("Device connected from {addr}");
        let ledger = ledger.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, ledger).await {
                warn!("Connection {addr} dropped: {e}");
            }
            info!("Device {addr} disconnected");
        });
    }
}

/// Answers frames strictly in order, one reply per request.
async fn handle_connection(stream: TcpStream, ledger: Arc<Mutex<Ledger>>) -> Result<(), WireError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let mut frame = Vec::new();
        let mut limited = (&mut reader).take(wire::MAX_FRAME_LEN as u64);
        if limited.read_until(wire::FRAME_END, &mut frame).await? == 0 {
            return Ok(());
        }
        // no terminator: peer closed mid-frame or the frame is too long
        if frame.last() != Some(&wire::FRAME_END) {
            return Err(WireError::Closed);
        }
        debug!("Received {} byte frame", frame.len());

        let ledger = ledger.clone();
        let response = tokio::task::spawn_blocking(move || {
            let mut ledger = match ledger.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            ledger.handle_frame(&mut frame)
        })
        .await
        .unwrap_or_else(|e| Response::Error(ErrorResponse::new(ErrorKind::Internal, e.to_string())));

        writer.write_all(&wire::encode(&response)?).await?;
    }
}
