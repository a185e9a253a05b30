//! jotter-keygen: generate server secrets.
//!
//! Prints random values suitable for `ENCRYPTION_KEY` and `JWT_SECRET`.

use base64::Engine;
use clap::{Parser, ValueEnum};
use jotter_crypto::{generate_random, validate_secret};
use std::process::ExitCode;

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    /// Standard base64
    Base64,
    /// URL-safe base64 without padding
    Url,
}

#[derive(Parser)]
#[command(name = "jotter-keygen")]
#[command(author, version, about = "Generate server secrets for jotter")]
struct Cli {
    /// Print in dotenv form (`ENCRYPTION_KEY=...` and `JWT_SECRET=...`)
    #[arg(long)]
    env: bool,

    /// Output encoding
    #[arg(short, long, value_enum, default_value = "base64")]
    encoding: Encoding,

    /// Number of secrets to print (ignored with --env)
    #[arg(short, long, default_value_t = 1)]
    count: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.env {
        println!("ENCRYPTION_KEY={}", new_secret(cli.encoding)?);
        println!("JWT_SECRET={}", new_secret(cli.encoding)?);
        return Ok(());
    }

    for _ in 0..cli.count {
        println!("{}", new_secret(cli.encoding)?);
    }
    Ok(())
}

fn new_secret(encoding: Encoding) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = generate_random::<32>();
    let secret = match encoding {
        Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
        Encoding::Url => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
    };
    validate_secret(&secret)?;
    Ok(secret)
}
