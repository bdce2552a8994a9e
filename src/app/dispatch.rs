use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::info;

use palate::Config;
use palate::config::ObservabilityConfig;
use palate::core::taste::create_taste_engine;
use palate::error::{ConfigError, PalateError};
use palate::observability::init_tracing;
use palate::transport::Contract;
use palate::transport::gateway::run_gateway;
use palate::transport::stdio;

pub async fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { force } => {
            init_config(cli.config.as_deref(), force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { port, host } => {
            let config = Config::load(cli.config.as_deref())?;
            init_tracing(&config.observability);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            run_gateway(&host, port, Arc::new(config)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cluster { input } => {
            run_oneshot(cli.config.as_deref(), Contract::Cluster, input, |_| {}).await
        }
        Commands::Rank {
            input,
            top_n,
            dislike_weight,
        } => {
            run_oneshot(cli.config.as_deref(), Contract::Rank, input, |config| {
                if let Some(n) = top_n {
                    config.ranking.top_n = n;
                }
                if let Some(w) = dislike_weight {
                    config.ranking.dislike_weight = w;
                }
            })
            .await
        }
    }
}

/// One request in, one JSON document out. Every failure, including a bad
/// config, is reported as an envelope on stdout with exit status 1.
async fn run_oneshot(
    config_path: Option<&str>,
    contract: Contract,
    input: Option<PathBuf>,
    adjust: impl FnOnce(&mut Config),
) -> Result<ExitCode> {
    let prepared = prepare(config_path, adjust);
    let engine = match prepared {
        Ok(engine) => engine,
        Err(err) => {
            init_tracing(&ObservabilityConfig::default());
            return write_failure(&err).await;
        }
    };

    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => match tokio::fs::File::open(&path).await {
            Ok(file) => Box::new(file),
            Err(err) => {
                let err = anyhow::Error::new(err)
                    .context(format!("failed to open input file {}", path.display()));
                return write_failure(&PalateError::Other(err)).await;
            }
        },
        None => Box::new(tokio::io::stdin()),
    };

    let ok = stdio::run(engine.as_ref(), contract, reader, tokio::io::stdout())
        .await
        .context("write response")?;
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn prepare(
    config_path: Option<&str>,
    adjust: impl FnOnce(&mut Config),
) -> Result<Arc<dyn palate::core::taste::TasteEngine>, PalateError> {
    let mut config =
        Config::load(config_path).map_err(|e| ConfigError::Load(format!("{e:#}")))?;
    adjust(&mut config);
    config.validate()?;
    init_tracing(&config.observability);
    Ok(create_taste_engine(&config)?)
}

async fn write_failure(err: &PalateError) -> Result<ExitCode> {
    use tokio::io::AsyncWriteExt;

    tracing::error!(error = %err, "Request failed");
    let mut payload = serde_json::to_vec(&err.envelope()).context("serialize error envelope")?;
    payload.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&payload).await.context("write error envelope")?;
    stdout.flush().await.context("flush stdout")?;
    Ok(ExitCode::FAILURE)
}

fn init_config(explicit: Option<&str>, force: bool) -> Result<()> {
    let config_path = match explicit {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
        None => Config::default_dir().join("config.toml"),
    };
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    let config = Config {
        config_path,
        ..Config::default()
    };
    config.save()?;
    info!(path = %config.config_path.display(), "Wrote default configuration");
    println!("Wrote {}", config.config_path.display());
    Ok(())
}
