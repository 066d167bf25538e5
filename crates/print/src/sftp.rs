//! SFTP delivery of order PDFs.
//!
//! Configuration is read from the environment on every upload:
//!
//! | Variable | Required | Meaning |
//! |---|---|---|
//! | `ORDER_PDF_FTP_SERVER` | yes | `host[:port]`, optional `sftp://` or `ssh://` prefix |
//! | `ORDER_PDF_FTP_USER` | yes | login name |
//! | `ORDER_PDF_FTP_PASSWORD` | yes | password |
//! | `ORDER_PDF_FTP_TIMEOUT` | no | seconds, `0` means default (10 s) |
//! | `ORDER_PDF_FTP_INSECURE_IGNORE_HOST_KEY` | no | skip `known_hosts` verification |

use std::io::Write;
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use ssh2::{CheckResult, KnownHostFileKind, OpenFlags, OpenType, Session, Sftp};

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_SERVER: &str = "ORDER_PDF_FTP_SERVER";
const ENV_USER: &str = "ORDER_PDF_FTP_USER";
const ENV_PASSWORD: &str = "ORDER_PDF_FTP_PASSWORD";
const ENV_TIMEOUT: &str = "ORDER_PDF_FTP_TIMEOUT";
const ENV_INSECURE: &str = "ORDER_PDF_FTP_INSECURE_IGNORE_HOST_KEY";

#[derive(Debug, thiserror::Error)]
pub enum FtpError {
    /// Required configuration is absent or malformed.
    #[error("ftp-config-missing: {0}")]
    ConfigMissing(String),

    /// A connect, auth, mkdir, open, write or close step failed.
    #[error("ftp-upload-failed during {stage}: {message}")]
    UploadFailed { stage: &'static str, message: String },
}

fn failed(stage: &'static str) -> impl Fn(ssh2::Error) -> FtpError {
    move |e| FtpError::UploadFailed {
        stage,
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
    pub insecure_ignore_host_key: bool,
    pub known_hosts: Option<PathBuf>,
}

impl std::fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("timeout", &self.timeout)
            .field("insecure_ignore_host_key", &self.insecure_ignore_host_key)
            .finish_non_exhaustive()
    }
}

impl SftpConfig {
    pub fn from_env() -> Result<Self, FtpError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FtpError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FtpError::ConfigMissing(format!("{key} is not set")))
        };

        let server = required(ENV_SERVER)?;
        let user = required(ENV_USER)?;
        let password = required(ENV_PASSWORD)?;
        let (host, port) = parse_server(&server)?;
        let timeout = parse_timeout(lookup(ENV_TIMEOUT).as_deref())?;
        let insecure_ignore_host_key = lookup(ENV_INSECURE)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        let known_hosts = lookup("HOME").map(|home| Path::new(&home).join(".ssh/known_hosts"));

        Ok(Self {
            host,
            port,
            user,
            password,
            timeout,
            insecure_ignore_host_key,
            known_hosts,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Unset, blank and `0` mean the default; negative or non-numeric is an error.
fn parse_timeout(raw: Option<&str>) -> Result<Duration, FtpError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_TIMEOUT);
    };
    let secs: i64 = raw
        .parse()
        .map_err(|_| FtpError::ConfigMissing(format!("{ENV_TIMEOUT} is not a number: {raw}")))?;
    match secs {
        s if s < 0 => Err(FtpError::ConfigMissing(format!(
            "{ENV_TIMEOUT} must not be negative"
        ))),
        0 => Ok(DEFAULT_TIMEOUT),
        s => Ok(Duration::from_secs(s.unsigned_abs())),
    }
}

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid regex")
});

/// Split `server` into host and port, stripping an `sftp://` or `ssh://` scheme.
pub fn parse_server(server: &str) -> Result<(String, u16), FtpError> {
    let trimmed = server.trim();
    let rest = ["sftp://", "ssh://"]
        .iter()
        .find_map(|scheme| {
            trimmed
                .get(..scheme.len())
                .filter(|p| p.eq_ignore_ascii_case(scheme))
                .map(|_| &trimmed[scheme.len()..])
        })
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    let invalid = || FtpError::ConfigMissing(format!("{ENV_SERVER} is not a valid host: {server}"));

    let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, tail) = bracketed.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(p) => Some(p),
            None if tail.is_empty() => None,
            None => return Err(invalid()),
        };
        (host, port)
    } else if rest.matches(':').count() > 1 {
        (rest, None)
    } else {
        match rest.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (rest, None),
        }
    };

    let port = match port {
        Some(p) => p.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(invalid)?,
        None => DEFAULT_PORT,
    };

    let valid = host.parse::<IpAddr>().is_ok() || HOSTNAME_RE.is_match(host);
    if host.is_empty() || !valid {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}

// ---------------------------------------------------------------------------
// Uploader
// ---------------------------------------------------------------------------

/// Delivers a finished PDF to the print shop.
#[async_trait]
pub trait PdfUploader: Send + Sync {
    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), FtpError>;
}

/// Uploads over SFTP using the environment configuration current at call time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SftpUploader;

#[async_trait]
impl PdfUploader for SftpUploader {
    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), FtpError> {
        let config = SftpConfig::from_env()?;
        let remote_path = remote_path.to_string();
        tokio::task::spawn_blocking(move || upload_blocking(&config, &remote_path, &bytes))
            .await
            .map_err(|e| FtpError::UploadFailed {
                stage: "task",
                message: e.to_string(),
            })?
    }
}

/// Connect, authenticate, write the file and close everything in order.
///
/// Closing the remote file is part of the write and must succeed; failures
/// while closing the SFTP channel or the SSH session are only logged.
pub fn upload_blocking(config: &SftpConfig, remote_path: &str, bytes: &[u8]) -> Result<(), FtpError> {
    let addr = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| FtpError::UploadFailed {
            stage: "resolve",
            message: e.to_string(),
        })?
        .next()
        .ok_or_else(|| FtpError::UploadFailed {
            stage: "resolve",
            message: format!("no address for {}", config.host),
        })?;

    let tcp = TcpStream::connect_timeout(&addr, config.timeout).map_err(|e| {
        FtpError::UploadFailed {
            stage: "connect",
            message: e.to_string(),
        }
    })?;

    let mut session = Session::new().map_err(failed("session"))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(config.timeout.as_millis()).unwrap_or(u32::MAX));
    session.handshake().map_err(failed("handshake"))?;

    if config.insecure_ignore_host_key {
        tracing::warn!(host = %config.host, "SFTP host key verification disabled");
    } else {
        verify_host_key(&session, config)?;
    }

    session
        .userauth_password(&config.user, &config.password)
        .map_err(failed("auth"))?;
    if !session.authenticated() {
        return Err(FtpError::UploadFailed {
            stage: "auth",
            message: "server rejected credentials".into(),
        });
    }

    let mut sftp = session.sftp().map_err(failed("sftp"))?;
    let remote = Path::new(remote_path);
    if let Some(parent) = remote.parent().filter(|p| !p.as_os_str().is_empty()) {
        mkdir_all(&sftp, parent)?;
    }

    let mut file = sftp
        .open_mode(
            remote,
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            0o644,
            OpenType::File,
        )
        .map_err(failed("open"))?;
    file.write_all(bytes).map_err(|e| FtpError::UploadFailed {
        stage: "write",
        message: e.to_string(),
    })?;
    file.close().map_err(failed("close"))?;
    drop(file);

    if let Err(e) = sftp.shutdown() {
        tracing::warn!(error = %e, "Failed to close SFTP channel after upload");
    }
    if let Err(e) = session.disconnect(None, "upload complete", None) {
        tracing::warn!(error = %e, "Failed to close SSH session after upload");
    }

    tracing::info!(host = %config.host, remote_path, bytes = bytes.len(), "Order PDF uploaded");
    Ok(())
}

fn verify_host_key(session: &Session, config: &SftpConfig) -> Result<(), FtpError> {
    let path = config.known_hosts.as_ref().ok_or_else(|| FtpError::UploadFailed {
        stage: "host-key",
        message: "no known_hosts file (HOME is not set)".into(),
    })?;
    let mut known = session.known_hosts().map_err(failed("host-key"))?;
    known
        .read_file(path, KnownHostFileKind::OpenSSH)
        .map_err(failed("host-key"))?;
    let (key, _) = session.host_key().ok_or_else(|| FtpError::UploadFailed {
        stage: "host-key",
        message: "server sent no host key".into(),
    })?;
    let problem = match known.check_port(&config.host, config.port, key) {
        CheckResult::Match => return Ok(()),
        CheckResult::Mismatch => "host key does not match known_hosts",
        CheckResult::NotFound => "host is not listed in known_hosts",
        CheckResult::Failure => "known_hosts check failed",
    };
    Err(FtpError::UploadFailed {
        stage: "host-key",
        message: problem.into(),
    })
}

/// Create every missing directory along `dir`.
fn mkdir_all(sftp: &Sftp, dir: &Path) -> Result<(), FtpError> {
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        if sftp.stat(&current).is_ok() {
            continue;
        }
        if let Err(e) = sftp.mkdir(&current, 0o755) {
            // A concurrent upload may have created it in the meantime.
            if sftp.stat(&current).is_err() {
                return Err(failed("mkdir")(e));
            }
        }
    }
    Ok(())
}
