//! Issue a bearer credential for a user, signed with the service secret.
//!
//! Login lives outside this service; the tool exists for operators and local
//! development.

use std::env;
use std::io::{self, Write};

use careline::domain::UserId;
use careline::domain::ports::AccessTokenCodec;
use careline::outbound::tokens::{JwtAccessTokenCodec, secret_fingerprint};
use clap::Parser;
use mockable::{Clock, DefaultClock};
use zeroize::Zeroizing;

const SECRET_ENV: &str = "CARELINE_JWT_SECRET";
const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// `issue-token` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "issue-token",
    about = "Sign a Careline bearer credential for an existing user",
    version
)]
struct CliArgs {
    /// User id (UUID) carried as the credential subject.
    #[arg(long = "subject", value_name = "uuid", value_parser = parse_subject)]
    subject: UserId,
    /// Signing secret. Falls back to `CARELINE_JWT_SECRET` when omitted.
    #[arg(long = "secret", value_name = "secret")]
    secret: Option<String>,
    /// Credential lifetime in seconds.
    #[arg(long = "ttl-secs", value_name = "seconds", default_value_t = DEFAULT_TTL_SECS)]
    ttl_secs: i64,
}

fn parse_subject(raw: &str) -> Result<UserId, String> {
    UserId::new(raw).map_err(|error| error.to_string())
}

fn resolve_secret(cli_secret: Option<String>) -> io::Result<Zeroizing<Vec<u8>>> {
    cli_secret
        .or_else(|| env::var(SECRET_ENV).ok())
        .filter(|secret| !secret.trim().is_empty())
        .map(|secret| Zeroizing::new(secret.into_bytes()))
        .ok_or_else(|| io::Error::other(format!("provide --secret or set {SECRET_ENV}")))
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    if args.ttl_secs <= 0 {
        return Err(io::Error::other("--ttl-secs must be positive"));
    }
    let secret = resolve_secret(args.secret)?;
    let codec = JwtAccessTokenCodec::new(&secret, chrono::Duration::seconds(args.ttl_secs));
    let token = codec
        .issue(&args.subject, DefaultClock.utc())
        .map_err(|error| io::Error::other(format!("sign credential: {error}")))?;

    let mut stderr = io::stderr().lock();
    writeln!(
        stderr,
        "signed for {} with secret {}",
        args.subject,
        secret_fingerprint(&secret)
    )?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{token}")
}
