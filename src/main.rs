#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{Level, info, warn};

use linkforge::cli::Args;
use linkforge::generator::{Generator, GeneratorSettings, expand_tilde};
use linkforge::parser::detection::split_links;
use linkforge::service::ConversionService;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if !args.has_input() {
        anyhow::bail!("No links given; pass links, --links or --input");
    }

    let settings = match &args.config {
        Some(path) => {
            info!("Loading generator settings from: {}", path);
            GeneratorSettings::load(path).await?
        }
        None => GeneratorSettings::default(),
    };
    let variant = args.variant.unwrap_or(settings.variant);
    let mode = args.mode.unwrap_or(settings.mode);

    let mut links = args.inline_links();
    if let Some(input) = &args.input {
        let content = read_input(input).await?;
        links.extend(split_links(&content));
    }
    info!("Read {} link lines", links.len());

    let service = ConversionService::new(Generator::new(settings));
    let conversion = service
        .convert(links.as_slice(), variant, mode)
        .context("Conversion failed")?;
    if conversion.invalid_count > 0 {
        warn!(
            "Skipped {} invalid links, see warnings above",
            conversion.invalid_count
        );
    }

    write_output(args.output.as_deref(), &conversion.text).await?;
    info!(
        "Config generation complete: {} proxies ({}, {})",
        conversion.node_count, variant, mode
    );
    Ok(())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .context("Failed to read links from stdin")?;
        return Ok(content);
    }

    let path = expand_tilde(input);
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read links from {path:?}"))
}

async fn write_output(output: Option<&str>, text: &str) -> Result<()> {
    let Some(output) = output else {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(text.as_bytes())
            .await
            .context("Failed to write config to stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
        return Ok(());
    };

    let expanded = expand_tilde(output);
    let path = Path::new(&expanded);

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {parent:?}"))?;
    }

    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write config to {path:?}"))?;
    info!("Config written to {:?}", path);
    Ok(())
}
