mod args;

use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use send_email::{load, CurlTransport, Error, FileLogger, Loaded, CONFIG_FILE_NAME, LOG_FILE_NAME};

use crate::args::Args;

/// How a run ended, before it turns into an exit status.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Outcome {
    Help,
    FirstRun,
    Sent,
    SendFailed,
    BadArguments,
}

fn exit_status(result: &Result<Outcome>) -> u8 {
    match result {
        Ok(Outcome::Help) | Ok(Outcome::FirstRun) | Ok(Outcome::Sent) => 0,
        Ok(Outcome::SendFailed) | Ok(Outcome::BadArguments) => 1,
        Err(_) => 1,
    }
}

fn parse_args(args: Vec<OsString>) -> std::result::Result<Args, Outcome> {
    if args.len() <= 1 {
        let _ = Args::command().print_help();
        return Err(Outcome::Help);
    }
    Args::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        if e.use_stderr() {
            Outcome::BadArguments
        } else {
            Outcome::Help
        }
    })
}

/// Failed deliveries are already reported by the logger; anything else is a fatal error.
fn send_outcome(result: send_email::Result<()>) -> Result<Outcome> {
    match result {
        Ok(()) => Ok(Outcome::Sent),
        Err(Error::Delivery(_)) | Err(Error::Spawn(_, _)) => Ok(Outcome::SendFailed),
        Err(e) => Err(e.into()),
    }
}

fn run(args: &Args, exe_dir: &Path) -> Result<Outcome> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| exe_dir.join(CONFIG_FILE_NAME));

    let config = match load(&config_path)? {
        Loaded::Config(config) => config,
        Loaded::Created(path) => {
            println!(
                "config file {} did not exist, a template was created.",
                path.display()
            );
            println!("edit it and run again.");
            return Ok(Outcome::FirstRun);
        }
    };
    log::debug!("loaded config from {}", config_path.display());

    let mut transport = CurlTransport::new(config.smtp_client.as_deref(), args.debug);
    let mut logger = FileLogger::new(Some(exe_dir.join(LOG_FILE_NAME)));
    if let Some(path) = logger.path() {
        log::debug!("recording activity in {}", path.display());
    }
    send_outcome(send_email::send(
        &config,
        &args.overrides(),
        &mut transport,
        &mut logger,
    ))
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args_os().collect()) {
        Ok(args) => args,
        Err(outcome) => return ExitCode::from(exit_status(&Ok(outcome))),
    };

    env_logger::Builder::new()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let result = send_email::executable_dir()
        .context("cannot locate the executable")
        .and_then(|dir| run(&args, &dir));
    if let Err(err) = &result {
        eprintln!("error: {:#}", err);
    }
    ExitCode::from(exit_status(&result))
}
