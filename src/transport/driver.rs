//! Connection driver - background tasks that move bytes between a socket
//! and a session.
//!
//! The writer task owns the write half and performs the writes the session
//! submits through [`IoController`]. The reader task owns the read half and
//! feeds everything it reads to the [`Parser`], which dispatches frames to
//! the session.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc::{self, error::SendError};
use tokio::sync::Notify;

use crate::codec::Parser;
use crate::error::Result;
use crate::session::{Controller, Session, WriteHandler};

/// Read buffer size for the reader task.
pub const READ_BUFFER_SIZE: usize = 8192;

/// Command sent from the controller to the writer task
pub enum WriterCommand {
    /// Write the bytes, then report through the handler
    Write(Bytes, WriteHandler),
    /// Shut the connection down
    Close { graceful: bool },
}

/// [`Controller`] backed by the writer task.
pub struct IoController {
    /// Channel for sending commands to the writer
    command_tx: mpsc::UnboundedSender<WriterCommand>,
}

impl IoController {
    pub fn new(command_tx: mpsc::UnboundedSender<WriterCommand>) -> Self {
        Self { command_tx }
    }
}

impl Controller for IoController {
    fn write(&self, bytes: Bytes, handler: WriteHandler) {
        if let Err(SendError(WriterCommand::Write(_, handler))) =
            self.command_tx.send(WriterCommand::Write(bytes, handler))
        {
            handler.failed(io::Error::new(io::ErrorKind::BrokenPipe, "writer task stopped"));
        }
    }

    fn close(&self, graceful: bool) {
        // a stopped writer has nothing left to close
        let _ = self.command_tx.send(WriterCommand::Close { graceful });
    }
}

/// Writer task: performs one write at a time and reports completion.
pub async fn write_loop<S>(
    mut writer: WriteHalf<S>,
    mut command_rx: mpsc::UnboundedReceiver<WriterCommand>,
    stop_reader: Arc<Notify>,
) -> Result<()>
where
    S: AsyncWrite,
{
    while let Some(command) = command_rx.recv().await {
        match command {
            WriterCommand::Write(bytes, handler) => {
                write_one(&mut writer, bytes, handler).await;
            }
            WriterCommand::Close { graceful } => {
                if graceful {
                    // completing a write may queue the next one, so keep
                    // draining until nothing is left
                    while let Ok(command) = command_rx.try_recv() {
                        if let WriterCommand::Write(bytes, handler) = command {
                            write_one(&mut writer, bytes, handler).await;
                        }
                    }
                }
                tracing::debug!("Closing connection (graceful: {})", graceful);
                stop_reader.notify_one();
                writer.shutdown().await?;
                return Ok(());
            }
        }
    }
    // every controller is gone
    stop_reader.notify_one();
    Ok(())
}

async fn write_one<S>(writer: &mut WriteHalf<S>, bytes: Bytes, handler: WriteHandler)
where
    S: AsyncWrite,
{
    let result = async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    }
    .await;
    match result {
        Ok(()) => handler.complete(),
        Err(e) => handler.failed(e),
    }
}

/// Reader task: feeds the parser until EOF, a read error, or a close.
pub async fn read_loop<S>(
    mut reader: ReadHalf<S>,
    session: Arc<Session>,
    controller: Arc<dyn Controller>,
    stop: Arc<Notify>,
) -> Result<()>
where
    S: AsyncRead,
{
    let mut parser = Parser::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            _ = stop.notified() => {
                tracing::debug!("Reader stopped");
                return Ok(());
            }
            read = reader.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        tracing::debug!("Connection closed by peer");
                        controller.close(true);
                        return Ok(());
                    }
                    Ok(n) => parser.parse(&buf[..n], session.as_ref()),
                    Err(e) => {
                        tracing::error!("Read error: {:?}", e);
                        controller.close(false);
                        return Err(e.into());
                    }
                }
            }
        }
    }
}
