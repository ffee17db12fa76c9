//! ECHONET Lite Probe
//!
//! Sweeps an ECHONET Lite node for power-related properties and prints every
//! value it could read.
//!
//! Usage: `echonet-probe <host> [--port <port>] [--timeout <ms>] [--delay <ms>]`

use echonet_probe::{probe_host, util::CommunicationStats, ProbeConfig};
use std::{env, process::ExitCode, time::Duration};

const USAGE: &str = "Usage: echonet-probe <host> [--port <port>] [--timeout <ms>] [--delay <ms>]";

fn summary(stats: &CommunicationStats) -> String {
    format!(
        "{} requests, {} responses, {} timeouts ({:.1}% answered)",
        stats.messages_sent,
        stats.messages_received,
        stats.timeouts,
        stats.success_rate()
    )
}

fn parse_args(args: &[String]) -> Result<(String, ProbeConfig), String> {
    let mut host = None;
    let mut config = ProbeConfig::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--port" | "--timeout" | "--delay" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{} needs a value", arg))?;
                let number: u64 = value
                    .parse()
                    .map_err(|_| format!("invalid value for {}: {}", arg, value))?;
                match arg.as_str() {
                    "--port" => {
                        config.port = u16::try_from(number)
                            .map_err(|_| format!("port out of range: {}", number))?
                    }
                    "--timeout" => config.response_timeout = Duration::from_millis(number),
                    _ => config.request_delay = Duration::from_millis(number),
                }
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown option {}", other)),
            other if host.is_none() => host = Some(other.to_string()),
            other => return Err(format!("unexpected argument {}", other)),
        }
    }

    let host = host.ok_or_else(|| USAGE.to_string())?;
    Ok((host, config))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (host, config) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    println!("Probing ECHONET Lite device at {}:{}...", host, config.port);

    let report = match probe_host(&host, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if report.is_success() {
        println!("\n===== SUCCESSFUL READINGS =====");
        for reading in &report.readings {
            println!("{}", reading);
        }
        println!("\n{}", summary(&report.stats));
        ExitCode::SUCCESS
    } else {
        println!("\nNo readings could be retrieved from the device.");
        ExitCode::FAILURE
    }
}
