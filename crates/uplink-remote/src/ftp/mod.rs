//! Passive-mode FTP backend.
//!
//! One control connection carries every command; each transfer opens a
//! fresh passive data connection. Listings prefer `MLSD` for its
//! machine-readable entry types and fall back to parsing Unix `LIST` output
//! when the server refuses it.

mod config;
pub mod listing;
pub mod reply;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

pub use config::FtpConfig;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::RemoteFs;
use crate::types::RemoteEntry;
use listing::{parse_list_line, parse_listing, parse_mlsd_line};
use reply::{parse_pasv, Reply, ReplyParser};

/// An authenticated FTP session.
pub struct FtpRemote {
    control: BufReader<TcpStream>,
    peer: IpAddr,
    connect_timeout: Duration,
    mlsd: bool,
    closed: bool,
}

impl FtpRemote {
    /// Connect, log in, and switch to binary transfers.
    pub async fn connect(config: &FtpConfig) -> RemoteResult<Self> {
        let stream = dial(&config.host, config.port, config.connect_timeout).await?;
        let peer = stream.peer_addr()?.ip();
        let mut ftp = Self {
            control: BufReader::new(stream),
            peer,
            connect_timeout: config.connect_timeout,
            mlsd: true,
            closed: false,
        };
        let greeting = ftp.read_reply().await?;
        check("connect", greeting, &[220])?;
        ftp.login(&config.username, &config.password).await?;
        ftp.command("TYPE", Some("I"), &[200]).await?;
        debug!(host = %config.host, port = config.port, "FTP session established");
        Ok(ftp)
    }

    async fn login(&mut self, username: &str, password: &str) -> RemoteResult<()> {
        let reply = self.command("USER", Some(username), &[230, 331]).await?;
        if reply.code == 331 {
            self.command("PASS", Some(password), &[230, 202]).await?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> RemoteResult<()> {
        if self.closed {
            Err(RemoteError::Closed)
        } else {
            Ok(())
        }
    }

    async fn send(&mut self, verb: &str, arg: Option<&str>) -> RemoteResult<()> {
        let line = match arg {
            Some(arg) => format!("{verb} {arg}\r\n"),
            None => format!("{verb}\r\n"),
        };
        if verb == "PASS" {
            trace!("> PASS ****");
        } else {
            trace!("> {}", line.trim_end());
        }
        let stream = self.control.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> RemoteResult<Reply> {
        let mut parser = ReplyParser::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.control.read_until(b'\n', &mut buf).await? == 0 {
                return Err(RemoteError::Closed);
            }
            let line = String::from_utf8_lossy(&buf);
            if let Some(reply) = parser.feed(&line).map_err(RemoteError::Transport)? {
                trace!("< {} {}", reply.code, reply.message());
                return Ok(reply);
            }
        }
    }

    async fn command(&mut self, verb: &str, arg: Option<&str>, expect: &[u16]) -> RemoteResult<Reply> {
        self.send(verb, arg).await?;
        let reply = self.read_reply().await?;
        check(verb, reply, expect)
    }

    /// Enter passive mode and connect the data channel.
    async fn open_data(&mut self) -> RemoteResult<TcpStream> {
        let reply = self.command("PASV", None, &[227]).await?;
        let addr = parse_pasv(&reply.message()).ok_or_else(|| {
            RemoteError::Transport(format!("unparsable PASV reply: {}", reply.message()))
        })?;
        // Servers behind NAT sometimes advertise 0.0.0.0.
        let ip = if addr.ip().is_unspecified() {
            self.peer
        } else {
            IpAddr::V4(*addr.ip())
        };
        let target = SocketAddr::new(ip, addr.port());
        timeout(self.connect_timeout, TcpStream::connect(target))
            .await
            .map_err(|_| RemoteError::Transport(format!("data connection to {target} timed out")))?
            .map_err(RemoteError::from)
    }

    /// Run a command whose response body arrives on the data channel.
    async fn retrieve(&mut self, verb: &str, arg: &str) -> RemoteResult<Vec<u8>> {
        let mut data = self.open_data().await?;
        let start = self.command(verb, Some(arg), &[125, 150, 226, 250]).await?;
        let mut body = Vec::new();
        data.read_to_end(&mut body).await?;
        drop(data);
        if start.is_preliminary() {
            let done = self.read_reply().await?;
            check(verb, done, &[226, 250])?;
        }
        Ok(body)
    }

    /// Send `bytes` on the data channel as the payload of `verb`.
    async fn store(&mut self, verb: &str, arg: &str, bytes: &[u8]) -> RemoteResult<()> {
        let mut data = self.open_data().await?;
        self.command(verb, Some(arg), &[125, 150]).await?;
        data.write_all(bytes).await?;
        data.shutdown().await?;
        drop(data);
        let done = self.read_reply().await?;
        check(verb, done, &[226, 250])?;
        Ok(())
    }
}

async fn dial(host: &str, port: u16, limit: Duration) -> RemoteResult<TcpStream> {
    timeout(limit, TcpStream::connect((host, port)))
        .await
        .map_err(|_| RemoteError::Transport(format!("connecting to {host}:{port} timed out")))?
        .map_err(RemoteError::from)
}

fn check(command: &str, reply: Reply, expect: &[u16]) -> RemoteResult<Reply> {
    if expect.contains(&reply.code) {
        Ok(reply)
    } else {
        Err(RemoteError::Rejected {
            command: command.to_string(),
            code: reply.code,
            message: reply.message(),
        })
    }
}

#[async_trait]
impl RemoteFs for FtpRemote {
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.ensure_open()?;
        if self.mlsd {
            match self.retrieve("MLSD", dir).await {
                Ok(body) => {
                    return Ok(parse_listing(&String::from_utf8_lossy(&body), parse_mlsd_line))
                }
                Err(RemoteError::Rejected { code: 500 | 502, .. }) => {
                    debug!("server refused MLSD, falling back to LIST");
                    self.mlsd = false;
                }
                Err(e) => return Err(e),
            }
        }
        let body = self.retrieve("LIST", dir).await?;
        Ok(parse_listing(&String::from_utf8_lossy(&body), parse_list_line))
    }

    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()> {
        self.ensure_open()?;
        self.store("STOR", path, data).await
    }

    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>> {
        self.ensure_open()?;
        match self.retrieve("RETR", path).await {
            Err(RemoteError::Rejected { code: 550, .. }) => Err(RemoteError::NotFound(path.to_string())),
            other => other,
        }
    }

    async fn delete(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        self.command("DELE", Some(path), &[250]).await?;
        Ok(())
    }

    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        self.command("RMD", Some(path), &[250]).await?;
        Ok(())
    }

    async fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        self.command("MKD", Some(path), &[250, 257]).await?;
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.command("QUIT", None, &[221]).await.map(|_| ());
        let _ = self.control.get_mut().shutdown().await;
        result
    }
}
