//! cipherbox: passphrase-based encryption from stdin to stdout
//!
//! Usage:
//!   CKEY=... cipherbox encrypt|e|-e|--encrypt [--stream] < plain > sealed
//!   CKEY=... cipherbox decrypt|d|-d|--decrypt [--stream] < sealed > plain
//!
//! Modes:
//!   default   - read all of stdin, write one length-prefixed frame
//!   --stream  - fixed-size chunks with bounded memory; both sides must use
//!               the same --chunk-size
//!
//! Payload bytes go to stdout only. Logs and errors go to stderr.

mod config;

use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use cbx_crypto::{NonceSchedule, Params};
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::{debug, info};

use crate::config::CipherboxConfig;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cipherbox",
    version,
    about = "Encrypt or decrypt stdin to stdout with a passphrase",
    long_about = "cipherbox: scrypt + XChaCha20-Poly1305 encryption of stdin to stdout.\n\
                  The key is read from the environment variable named by --key-env (default CKEY).",
    group(
        ArgGroup::new("direction")
            .required(true)
            .args(["mode", "encrypt", "decrypt"])
    )
)]
struct Cli {
    /// Direction: encrypt (e) or decrypt (d)
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Encrypt stdin
    #[arg(short = 'e', long)]
    encrypt: bool,

    /// Decrypt stdin
    #[arg(short = 'd', long)]
    decrypt: bool,

    /// Process input in fixed-size chunks instead of one in-memory frame
    #[arg(long)]
    stream: bool,

    /// Plaintext bytes per chunk in --stream mode (overrides config)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Environment variable holding the key (overrides config)
    #[arg(long)]
    key_env: Option<String>,

    /// Seal each stream chunk under its own nonce (not readable by the shared-nonce format)
    #[arg(long)]
    per_chunk_nonce: bool,

    /// Path to cipherbox.toml configuration file
    #[arg(long, short = 'c', env = "CIPHERBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CIPHERBOX_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "CIPHERBOX_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum Mode {
    #[value(alias = "e")]
    Encrypt,
    #[value(alias = "d")]
    Decrypt,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

impl Cli {
    fn direction(&self) -> Result<Mode> {
        match (self.mode, self.encrypt, self.decrypt) {
            (Some(mode), false, false) => Ok(mode),
            (None, true, false) => Ok(Mode::Encrypt),
            (None, false, true) => Ok(Mode::Decrypt),
            _ => anyhow::bail!("exactly one of encrypt or decrypt is required"),
        }
    }
}

/// Flags merged over the config file.
#[derive(Debug)]
struct Settings {
    mode: Mode,
    stream: bool,
    chunk_size: usize,
    key_env: String,
    salt_size: usize,
    nonce_size: usize,
    key_size: usize,
    stream_nonce: NonceSchedule,
    log_level: String,
    log_format: LogFormat,
}

impl Settings {
    fn resolve(cli: &Cli, config: &CipherboxConfig) -> Result<Self> {
        let codec = &config.codec;
        let stream_nonce = if cli.per_chunk_nonce {
            NonceSchedule::PerChunk
        } else {
            codec.stream_nonce
        };
        let log_format = cli.log_format.unwrap_or(match config.log.format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        });

        Ok(Self {
            mode: cli.direction()?,
            stream: cli.stream,
            chunk_size: cli.chunk_size.unwrap_or(codec.chunk_size),
            key_env: cli.key_env.clone().unwrap_or_else(|| codec.key_env.clone()),
            salt_size: codec.salt_size,
            nonce_size: codec.nonce_size,
            key_size: codec.key_size,
            stream_nonce,
            log_level: cli.log.clone().unwrap_or_else(|| config.log.level.clone()),
            log_format,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, &config)?;

    init_logging(&settings.log_level, settings.log_format);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        mode = ?settings.mode,
        stream = settings.stream,
        "cipherbox starting"
    );

    let key = read_key(&settings.key_env)?;
    let params = build_params(&settings, key)?;

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    run(&settings, &params, stdin, stdout)
}

/// Logs go to stderr: stdout carries ciphertext or plaintext.
fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

/// Read the raw key bytes from environment variable `var`.
fn read_key(var: &str) -> Result<Vec<u8>> {
    match std::env::var_os(var) {
        Some(value) if !value.is_empty() => Ok(value.into_encoded_bytes()),
        _ => anyhow::bail!("{var} env var not set"),
    }
}

/// The whole key is the passphrase unless the config pins a key size.
fn build_params(settings: &Settings, key: Vec<u8>) -> Result<Params> {
    let key_size = if settings.key_size == 0 {
        key.len()
    } else {
        settings.key_size
    };

    Params::builder()
        .salt_size(settings.salt_size)
        .nonce_size(settings.nonce_size)
        .key_size(key_size)
        .key(key)
        .stream_nonce(settings.stream_nonce)
        .build()
        .context("Failed to initialize cipher")
}

// ── Payload processing ────────────────────────────────────────────────────────

fn run<R: Read, W: Write>(
    settings: &Settings,
    params: &Params,
    mut input: R,
    mut output: W,
) -> Result<()> {
    match (settings.mode, settings.stream) {
        (Mode::Encrypt, false) => {
            let data = read_all(&mut input)?;
            let frame = params.encrypt(&data).context("Failed to encrypt data")?;
            output.write_all(&frame).context("writing output")?;
        }
        (Mode::Decrypt, false) => {
            let data = read_all(&mut input)?;
            let plaintext = params.decrypt(&data).context("Failed to decrypt data")?;
            output.write_all(&plaintext).context("writing output")?;
        }
        (Mode::Encrypt, true) => {
            let summary = params
                .stream_encrypt(&mut input, &mut output, settings.chunk_size)
                .context("Failed to encrypt data")?;
            info!(chunks = summary.chunks, bytes = summary.plaintext_bytes, "stream encrypted");
        }
        (Mode::Decrypt, true) => {
            let summary = params
                .stream_decrypt(&mut input, &mut output, settings.chunk_size)
                .context("Failed to decrypt data")?;
            info!(chunks = summary.chunks, bytes = summary.plaintext_bytes, "stream decrypted");
        }
    }

    output.flush().context("flushing output")
}

fn read_all<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    input
        .read_to_end(&mut data)
        .context("Failed to read data from stdin")?;
    Ok(data)
}
