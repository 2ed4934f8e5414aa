mod config;

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::prelude::*;
use whois_rs::{Client, Error, ProgramSource, Response, ServerSource, Source};

/// Targets used when none are given on the command line.
const SAMPLE_TARGETS: &[&str] = &[
    "internet-census.org",
    "maialinux.org",
    "69.175.97.170",
    "google.com",
    "185.112.146.34",
    "172.217.20.46",
    "2a00:1450:400f:806::200e",
    "2a02:750:9::1be",
    "2001:470:0:76::2",
    "179.6.221.254",
    "196.46.23.12",
    "202.214.194.239",
    "nigeria.gov.ng",
    "185.222.211.10",
    "parsdata.com",
    "serv-mail.info",
    "vipps.no",
];

#[derive(Parser)]
#[command(
    version,
    about = "Looks up the network block and country code of domains and addresses"
)]
struct Args {
    /// Whois server to start the query from
    #[arg(short, long)]
    server: Option<String>,

    /// Whois client executable to use for the query
    #[arg(short, long)]
    whois_client: Option<PathBuf>,

    /// Report each result as a JSON object instead of text
    #[arg(long)]
    json: bool,

    /// Domains or IP addresses to look up
    targets: Vec<String>,
}

#[derive(Serialize)]
struct LookupMeta<'a> {
    resource: &'a str,
    cidr: Option<&'a str>,
    country_code: Option<&'a str>,
    country_codes: &'a [String],
    error: Option<String>,
}

fn print_text(target: &str, result: &Result<Response, Error>) {
    match result {
        Ok(response) => println!(
            "CIDR: {}\nCountryCode: {}\n---",
            response.cidr().unwrap_or(""),
            response.country_code().unwrap_or("")
        ),
        Err(e @ (Error::NoData { .. } | Error::NoResponse { .. })) => {
            debug!("No usable reply for {}: {e}", target);
            println!("No response\n---");
        }
        Err(e) => println!("Error querying for {}: {}\n---", target, e),
    }
}

fn print_json(target: &str, result: &Result<Response, Error>) {
    let meta = match result {
        Ok(response) => LookupMeta {
            resource: response.resource(),
            cidr: response.cidr(),
            country_code: response.country_code(),
            country_codes: response.country_codes(),
            error: None,
        },
        Err(e) => LookupMeta {
            resource: target,
            cidr: None,
            country_code: None,
            country_codes: &[],
            error: Some(e.to_string()),
        },
    };
    println!("{}", serde_json::to_string(&meta).unwrap());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = config::Config::new()?;
    let timeout = Duration::from_secs(
        config
            .query_timeout_secs
            .map(u64::from)
            .unwrap_or(whois_rs::DEFAULT_TIMEOUT_SECS),
    );

    let mut server = args.server.or(config.server);
    let mut program = args.whois_client.or(config.whois_client);
    // With nothing configured both paths are tried, the installed client
    // first as it knows more registries than this code does
    if server.is_none() && program.is_none() {
        program = Some(PathBuf::from(whois_rs::DEFAULT_PROGRAM));
        server = Some(whois_rs::IANA_SERVER.to_string());
    }

    let mut sources: Vec<Box<dyn Source>> = Vec::new();
    if let Some(program) = program {
        if program.is_file() {
            sources.push(Box::new(ProgramSource::new(program)));
        } else {
            warn!("Whois client {} not found, skipping", program.display());
        }
    }
    if let Some(server) = server {
        sources.push(Box::new(ServerSource::new(&server, timeout)));
    }
    let client = Client::new(sources);

    let targets: Vec<String> = if args.targets.is_empty() {
        SAMPLE_TARGETS.iter().map(|s| s.to_string()).collect()
    } else {
        args.targets
    };
    for target in &targets {
        info!("Looking up {}", target);
        if !args.json {
            println!("querying for {}", target);
        }
        let result = client.query(target);
        if args.json {
            print_json(target, &result);
        } else {
            print_text(target, &result);
        }
    }
    Ok(())
}
