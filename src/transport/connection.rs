//! A session bound to an async socket.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use super::driver::{read_loop, write_loop, IoController};
use crate::codec::StandardGenerator;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{Controller, Session, SessionFrameListener};

/// A running session over one socket.
///
/// Dropping the `Connection` does not stop the background tasks; they end
/// when the session closes the connection or the peer does.
pub struct Connection {
    session: Arc<Session>,
    reader: JoinHandle<Result<()>>,
    writer: JoinHandle<Result<()>>,
}

impl Connection {
    /// Split `io`, create the session and spawn the reader and writer tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(
        io: S,
        config: SessionConfig,
        listener: Option<Arc<dyn SessionFrameListener>>,
    ) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let generator =
            StandardGenerator::new().with_max_data_frame_size(config.max_data_frame_size);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let controller: Arc<dyn Controller> = Arc::new(IoController::new(command_tx));
        let session = Session::new(config, controller.clone(), Arc::new(generator), listener)?;

        let (read_half, write_half) = tokio::io::split(io);
        let stop = Arc::new(Notify::new());
        let writer = tokio::spawn(write_loop(write_half, command_rx, stop.clone()));
        let reader = tokio::spawn(read_loop(read_half, session.clone(), controller, stop));

        tracing::debug!("Started {:?}", session);
        Ok(Self {
            session,
            reader,
            writer,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Wait for both tasks to finish.
    pub async fn closed(self) -> Result<()> {
        let read = self.reader.await.map_err(join_error)?;
        let write = self.writer.await.map_err(join_error)?;
        read.and(write)
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(e))
}
