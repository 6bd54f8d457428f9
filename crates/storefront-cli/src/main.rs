// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::{Command, Runtime};
use std::env;
use std::path::PathBuf;
use storefront_app::Transport;
use storefront_remote::HttpTransport;
use storefront_testkit::{FakeRemote, demo_products};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STOREFRONT_LOG";
const DEMO_ROWS: usize = 12;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    init_tracing(options.verbosity);

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `storefront --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let schema = config.schema()?;
    let collection_path = config.collection_path();

    let transport: Box<dyn Transport> = if options.demo {
        Box::new(
            FakeRemote::new(&collection_path)
                .with_items(demo_products(DEMO_ROWS))
                .validating_products(),
        )
    } else {
        let base_url = config.base_url();
        Box::new(
            HttpTransport::new(&base_url, config.timeout()?).with_context(|| {
                format!(
                    "invalid [remote] config in {}; fix base_url or set STOREFRONT_BASE_URL",
                    options.config_path.display()
                )
            })?,
        )
    };
    if options.check_only {
        return Ok(());
    }

    let command = Command::parse(options.command.as_slice())?;
    debug!(?command, demo = options.demo, "running command");
    let mut runtime = Runtime::new(schema, &collection_path, transport);
    let output = runtime.execute(&command)?;
    debug!(
        revision = runtime.sync().collection().revision(),
        rows = runtime.sync().collection().len(),
        "collection synced"
    );
    print!("{output}");
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbosity == 0 {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
    } else {
        EnvFilter::new(fallback)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    verbosity: u8,
    command: Vec<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        verbosity: 0,
        command: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if !options.command.is_empty() {
            options.command.push(arg.as_ref().to_owned());
            continue;
        }
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--verbose" | "-v" => {
                options.verbosity = options.verbosity.saturating_add(1);
            }
            "-vv" => {
                options.verbosity = options.verbosity.saturating_add(2);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown if unknown.starts_with('-') => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
            command => {
                options.command.push(command.to_owned());
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("storefront [options] [command]");
    println!();
    println!("Commands:");
    println!("  list                       Fetch the collection and print it (default)");
    println!("  fields [create|update ID]  Print the fields of a create or update form");
    println!("  create key=value...        Create an entity from form values");
    println!("  update ID key=value...     Edit an entity, keeping unnamed fields");
    println!("  delete ID                  Delete an entity");
    println!();
    println!("Options:");
    println!("  --config <path>            Use a specific config path");
    println!("  --print-config-path        Print resolved config path");
    println!("  --print-example-config     Print a v1 config template");
    println!("  --demo                     Run against an in-memory demo collection");
    println!("  --check                    Validate config and remote settings");
    println!("  -v, -vv                    Log info or debug events to stderr");
    println!("  --help                     Show this help");
}
