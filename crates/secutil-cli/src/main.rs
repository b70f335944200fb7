//! secutil - operator tool
//!
//! - `nonce`: print a hex nonce from the OS CSPRNG
//! - `check`: load TLS settings and build the configuration the way a
//!   service would at startup, aborting on bad material

use std::process::ExitCode;

use clap::Parser;
use secutil::TlsConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

const SAMPLE_CONFIG: &str = r#"# secutil TLS settings

# Certificate (chain, leaf first) in PEM format
cert_path = "/etc/service/tls.crt"

# Private key matching the leaf certificate, PEM format
key_path = "/etc/service/tls.key"

# Optional CA bundle used to verify peers; omit to use the default roots
# ca_path = "/etc/service/ca.crt"
"#;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(cli.verbose)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Nonce { bytes } => {
            println!("{}", secutil::nonce_str(bytes));
        }
        Commands::Check { config } => {
            let settings = secutil::TlsSettings::load(config.as_deref())?;
            let material = settings.read_material()?;

            // Bad material ends the process here, as it would in a service.
            let tls = secutil::must_build_tls_config(
                &material.cert_pem,
                &material.key_pem,
                &material.ca_pem,
            );

            check(&tls)?;
        }
        Commands::GenerateConfig => {
            print!("{}", SAMPLE_CONFIG);
        }
    }

    Ok(())
}

/// Log filter used when `RUST_LOG` is unset. The library and this binary
/// both log under the `secutil` target.
fn default_directives(verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    format!("secutil={}", level)
}

/// Assemble client and server configs and report the outcome.
///
/// Returns `false` when a CA bundle was given but none of its entries could
/// be used, since no peer would be trusted.
fn check(tls: &TlsConfig) -> anyhow::Result<bool> {
    tls.client_config()?;

    let empty_bundle = tls.trust_anchors().is_some_and(|roots| roots.is_empty());
    if empty_bundle {
        tracing::warn!(
            fingerprint = %tls.fingerprint(),
            skipped = tls.skipped_trust_anchors(),
            "CA bundle has no usable trust anchors; no peer will be trusted"
        );
        return Ok(false);
    }

    tls.server_config()?;

    tracing::info!(
        fingerprint = %tls.fingerprint(),
        chain_len = tls.certificate_chain().len(),
        trust_anchors = ?tls.trust_anchors().map(|r| r.len()),
        skipped = tls.skipped_trust_anchors(),
        "TLS key material OK"
    );
    Ok(true)
}
