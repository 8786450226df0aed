use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use rxproof::core::Notification;
use rxproof::ledger::{Ledger, SqliteLedger};
use rxproof::{
    fingerprint_file, Client, ClientError, Keypair, RecordStatus, Registry, RxConfig,
};
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<u8> {
    let config = RxConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(ledger = %config.ledger_path.display(), algorithm = %config.digest.algorithm, "configuration loaded");

    let out = &mut std::io::stdout();
    match cli.command {
        Command::Keygen(args) => cmd_keygen(&config, args, cli.format, out),
        Command::Hash(args) => cmd_hash(&config, args, cli.format, out),
        Command::Record(args) => {
            cmd_record(&config, args, cli.format, out, &mut std::io::stderr()).await
        }
        Command::Verify(args) => cmd_verify(&config, args, cli.format, out).await,
        Command::Log(args) => cmd_log(&config, args, cli.format, out).await,
    }
}

fn cmd_keygen(
    config: &RxConfig,
    args: KeygenArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let path = args.out.as_deref().unwrap_or(config.identity.key_file.as_path());
    let keypair = Keypair::generate();
    write_key_file(path, &keypair, args.force)?;

    let caller = keypair.caller_id();
    match format {
        OutputFormat::Text => writeln!(out, "{}", caller)?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({ "caller_id": caller.to_hex(), "key_file": path.display().to_string() })
        )?,
    }
    Ok(0)
}

fn cmd_hash(
    config: &RxConfig,
    args: FileArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let digest = fingerprint_file(&config.producer(), &config.upload, &args.file)
        .with_context(|| format!("hashing {}", args.file.display()))?;

    match format {
        OutputFormat::Text => writeln!(out, "{}", digest)?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({ "digest": digest.to_hex(), "algorithm": config.digest.algorithm.name() })
        )?,
    }
    Ok(0)
}

async fn cmd_record(
    config: &RxConfig,
    args: FileArgs,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<u8> {
    let keypair = read_key_file(&config.identity.key_file)?;
    let client = Client::new(keypair, open_registry(config)?, config.producer())
        .with_upload_policy(config.upload.clone());
    submit_record(&client, &args.file, format, out, err).await
}

/// Record `file` through `client`. A rejected submission exits 1, not an error.
async fn submit_record<L: Ledger>(
    client: &Client<L>,
    file: &Path,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<u8> {
    let receipt = match client.record_file(file).await {
        Ok(receipt) => receipt,
        Err(ClientError::SubmissionRejected { reason }) => {
            tracing::warn!(%reason, "record rejected");
            writeln!(
                err,
                "verification was not recorded ({}); the file may be submitted again",
                reason
            )?;
            return Ok(1);
        }
        Err(e) => return Err(e).with_context(|| format!("recording {}", file.display())),
    };

    let status = match receipt.status {
        RecordStatus::Recorded => "recorded",
        RecordStatus::AlreadyRecorded => "already recorded",
    };
    match format {
        OutputFormat::Text => writeln!(out, "{} {}", status, receipt.digest)?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({
                "digest": receipt.digest.to_hex(),
                "status": status,
                "notification": notification_json(&receipt.notification),
            })
        )?,
    }
    Ok(0)
}

async fn cmd_verify(
    config: &RxConfig,
    args: FileArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let digest = fingerprint_file(&config.producer(), &config.upload, &args.file)
        .with_context(|| format!("hashing {}", args.file.display()))?;
    let registry = open_registry(config)?;
    let recorded = registry.is_recorded(&digest).await?;

    match format {
        OutputFormat::Text => writeln!(
            out,
            "{} {}",
            if recorded { "recorded" } else { "not recorded" },
            digest
        )?,
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({ "digest": digest.to_hex(), "recorded": recorded })
        )?,
    }
    Ok(0)
}

async fn cmd_log(
    config: &RxConfig,
    args: LogArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let registry = open_registry(config)?;
    let notifications = registry
        .ledger()
        .notifications_since(args.after, args.limit)
        .await?;

    match format {
        OutputFormat::Text => {
            for n in &notifications {
                writeln!(
                    out,
                    "{:>6}  {}  {}  {}",
                    n.seq, n.recorded_at, n.digest, n.recorded_by
                )?;
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = notifications.iter().map(notification_json).collect();
            writeln!(out, "{}", serde_json::Value::Array(rows))?;
        }
    }
    Ok(0)
}

fn open_registry(config: &RxConfig) -> anyhow::Result<Arc<Registry<SqliteLedger>>> {
    let ledger = SqliteLedger::open(&config.ledger_path)
        .with_context(|| format!("opening ledger {}", config.ledger_path.display()))?;
    Ok(Arc::new(Registry::new(ledger, config.registry_config())))
}

fn notification_json(n: &Notification) -> serde_json::Value {
    json!({
        "seq": n.seq,
        "digest": n.digest.to_hex(),
        "recorded_by": n.recorded_by.to_hex(),
        "recorded_at": n.recorded_at,
    })
}

fn write_key_file(path: &Path, keypair: &Keypair, force: bool) -> anyhow::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            bail!("{} already exists; pass --force to replace it", path.display())
        }
        Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
    };
    // `mode` only applies on create; a replaced file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting {}", path.display()))?;
    }
    writeln!(file, "{}", hex::encode(keypair.seed()))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn read_key_file(path: &Path) -> anyhow::Result<Keypair> {
    let text = std::fs::read_to_string(path).with_context(|| {
        format!(
            "reading identity {}; run `rxproof keygen` first",
            path.display()
        )
    })?;
    Keypair::from_seed_hex(&text).with_context(|| format!("parsing identity {}", path.display()))
}
