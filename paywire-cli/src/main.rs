//! `paywire`: sign, verify and decode payments API messages from the shell.

mod observability;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use paywire::{
    PaywireError,
    model::{
        CreatePaymentResponse, GetMandateResponse, GetPaymentResponse, GetPayoutResponse, ListResponse, MerchantAccount,
    },
    naming,
    signing::{RequestSigner, RequestVerifier, SigningKey},
    union::TaggedUnion,
    webhooks, wire,
};
use thiserror::Error;
use tracing::debug;

use crate::observability::{LogFormat, init_logging};

/// Payments API message tool.
#[derive(Debug, Parser)]
#[command(name = "paywire", version, about = "Sign, verify and decode payments API messages")]
struct Cli {
    /// Log at debug level; RUST_LOG takes precedence
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the Tl-Signature for a request
    Sign {
        /// Key id registered with the API
        #[arg(long)]
        key_id: String,
        /// PEM file with the P-521 private key
        #[arg(long)]
        key: PathBuf,
        /// JWKS URL to advertise in the signature header
        #[arg(long)]
        jku: Option<String>,
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Check a Tl-Signature against a request
    Verify {
        /// The Tl-Signature value
        #[arg(long)]
        signature: String,
        /// PEM file with the P-521 public key
        #[arg(long, conflicts_with = "jwks", required_unless_present = "jwks")]
        public_key: Option<PathBuf>,
        /// JWKS file; the key is selected by the signature's kid
        #[arg(long)]
        jwks: Option<PathBuf>,
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Decode a JSON message and print the resolved variant
    Decode {
        /// Message kind
        #[arg(value_enum)]
        kind: MessageKind,
        /// JSON file, or - for stdin
        file: PathBuf,
    },

    /// Print the wire name of each identifier
    WireName {
        /// Identifiers to convert
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// HTTP method
    #[arg(long, short = 'X', default_value = "POST")]
    method: String,
    /// Request path, e.g. /v3/payments
    #[arg(long)]
    path: String,
    /// Signed header as `Name: Value`; repeat in signing order
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    headers: Vec<(String, String)>,
    /// File with the exact request body
    #[arg(long)]
    body: Option<PathBuf>,
}

impl RequestArgs {
    fn header_refs(&self) -> Vec<(&str, &str)> {
        self.headers.iter().map(|(name, value)| (name.as_str(), value.as_str())).collect()
    }

    fn body(&self) -> Result<Vec<u8>, CliError> {
        self.body.as_deref().map_or_else(|| Ok(Vec::new()), read_input)
    }
}

/// Message kinds understood by `decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MessageKind {
    /// Response of creating a payment
    CreatePayment,
    /// A payment resource
    Payment,
    /// A payout resource
    Payout,
    /// A mandate resource
    Mandate,
    /// A page of merchant accounts
    MerchantAccounts,
    /// A webhook body
    Webhook,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Paywire(#[from] PaywireError),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogFormat::from_env(), if cli.verbose { "debug" } else { "info" });

    match run(&cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<String, CliError> {
    match command {
        Commands::Sign { key_id, key, jku, request } => sign(key_id, key, jku.as_deref(), request),
        Commands::Verify { signature, public_key, jwks, request } => {
            verify(signature, public_key.as_deref(), jwks.as_deref(), request)
        }
        Commands::Decode { kind, file } => decode(*kind, &read_input(file)?),
        Commands::WireName { identifiers } => {
            Ok(identifiers.iter().map(|identifier| naming::to_wire_name(identifier)).collect::<Vec<_>>().join("\n"))
        }
    }
}

fn sign(key_id: &str, key: &Path, jku: Option<&str>, request: &RequestArgs) -> Result<String, CliError> {
    let pem = read_text(key)?;
    let mut signer = RequestSigner::new(Arc::new(SigningKey::try_new(key_id, pem)?));
    if let Some(jku) = jku {
        signer = signer.with_jku(jku);
    }
    let body = request.body()?;
    Ok(signer.sign_request(&request.method, &request.path, &request.header_refs(), &body)?)
}

fn verify(
    signature: &str,
    public_key: Option<&Path>,
    jwks: Option<&Path>,
    request: &RequestArgs,
) -> Result<String, CliError> {
    let verifier = match (public_key, jwks) {
        (Some(path), _) => RequestVerifier::from_public_pem(read_text(path)?)?,
        (None, Some(path)) => {
            let kid = paywire::signing::extract_jws_header(signature)?.kid;
            debug!(%kid, jwks = %path.display(), "selecting verification key");
            RequestVerifier::from_jwks(read_input(path)?, &kid)?
        }
        (None, None) => {
            return Err(PaywireError::ConfigError("pass --public-key or --jwks".to_owned()).into());
        }
    };
    let body = request.body()?;
    let header = verifier.verify(signature, &request.method, &request.path, &request.header_refs(), &body)?;
    Ok(format!("signature valid (kid {}, headers [{}])", header.kid, header.tl_headers))
}

fn decode(kind: MessageKind, json: &[u8]) -> Result<String, CliError> {
    let text = String::from_utf8_lossy(json);
    match kind {
        MessageKind::CreatePayment => describe::<CreatePaymentResponse>(&text),
        MessageKind::Payment => describe::<GetPaymentResponse>(&text),
        MessageKind::Payout => describe::<GetPayoutResponse>(&text),
        MessageKind::Mandate => describe::<GetMandateResponse>(&text),
        MessageKind::MerchantAccounts => {
            let page: ListResponse<MerchantAccount> = wire::decode(&text).map_err(PaywireError::from)?;
            Ok(format!("{page:#?}"))
        }
        MessageKind::Webhook => {
            let event = webhooks::parse(json)?;
            Ok(format!("{}: {event:#?}", event.event_type()))
        }
    }
}

fn describe<U: TaggedUnion + fmt::Debug>(json: &str) -> Result<String, CliError> {
    let union = wire::decode_union::<U>(json).map_err(PaywireError::from)?;
    Ok(format!("{}: {union:#?}", union.discriminator()))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once(':').ok_or_else(|| format!("expected `Name: Value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in `{raw}`"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::Read::read_to_end(&mut io::stdin(), &mut buffer)
            .map_err(|source| CliError::Io { path: path.to_owned(), source })?;
        return Ok(buffer);
    }
    fs::read(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}
