use tokio::{
    io::AsyncWriteExt,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::Mutex,
};

use crate::{CommandChannel, CommandError, LinkError, LinkStatus, UpstreamLink, DEFAULT_INDI_PORT};

/// Plain TCP link to an INDI server.
///
/// Commands are written verbatim. The read half is handed out through
/// [`IndiTcpClient::take_reader`] to whatever decodes the server's stream into
/// push events.
#[derive(Debug)]
pub struct IndiTcpClient {
    port: u16,
    writer: Mutex<Option<OwnedWriteHalf>>,
    reader: Mutex<Option<OwnedReadHalf>>,
}

impl Default for IndiTcpClient {
    fn default() -> Self {
        Self::new(DEFAULT_INDI_PORT)
    }
}

impl IndiTcpClient {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            writer: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    pub async fn take_reader(&self) -> Option<OwnedReadHalf> {
        self.reader.lock().await.take()
    }
}

impl UpstreamLink for IndiTcpClient {
    async fn connect(&self, host: &str) -> Result<LinkStatus, LinkError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(LinkError::MissingHost);
        }
        let mut writer = self.writer.lock().await;
        if writer.is_some() {
            return Ok(LinkStatus::AlreadyConnected);
        }
        log::trace!("Connecting to INDI server {}:{}", host, self.port);
        let stream = TcpStream::connect((host, self.port))
            .await
            .map_err(|source| LinkError::Connect {
                host: host.to_owned(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();
        *writer = Some(write_half);
        *self.reader.lock().await = Some(read_half);
        Ok(LinkStatus::Connected)
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.reader.lock().await.take();
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

impl CommandChannel for IndiTcpClient {
    async fn send_command(&self, payload: &str) -> Result<(), CommandError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(CommandError::NotConnected);
        };
        if let Err(err) = writer.write_all(payload.as_bytes()).await {
            log::error!("Failed to send command: {}", err);
            guard.take();
            return Err(err.into());
        }
        Ok(())
    }
}
