//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("[catalog]");
    ctx.output.kv(
        "path",
        ctx.config.catalog.path.as_deref().unwrap_or("(bundled demo catalog)"),
    );

    ctx.output.info("[storage]");
    ctx.output.kv("dir", &ctx.config.storage.dir);
    if let Some(namespace) = &ctx.config.storage.namespace {
        ctx.output.kv("namespace", namespace);
    }

    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level);
    ctx.output.kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());

    ctx.output.info("[checkout]");
    ctx.output.kv(
        "default_payment_method",
        ctx.config.checkout.default_payment_method.as_str(),
    );

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("storefront.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = EnvFilter::try_new(&ctx.config.logging.level) {
        errors.push(format!("logging.level '{}' is invalid: {}", ctx.config.logging.level, e));
    }

    if ctx.config.storage.dir.trim().is_empty() {
        errors.push("storage.dir must not be empty".to_string());
    } else if !ctx.resolve_path(&ctx.config.storage.dir).exists() {
        warnings.push(format!(
            "storage.dir '{}' does not exist yet and will be created",
            ctx.config.storage.dir
        ));
    }

    // Fetch the catalog and check every product.
    match ctx.product_source()?.fetch().await {
        Ok(products) => {
            if products.is_empty() {
                warnings.push("catalog is empty".to_string());
            }
            for product in &products {
                if let Err(e) = product.validate() {
                    errors.push(e.to_string());
                }
            }
            ctx.output.kv("Products", &products.len().to_string());
        }
        Err(e) => errors.push(format!("catalog: {}", e)),
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
