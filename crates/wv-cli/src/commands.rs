use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use wv_sdk::{
    ClientConfig, ContentUploader, FileUpload, JsonRpcWallet, ProxyUploader, Submission,
    SubmissionId, WalletProvider, WalletSession, WorkVerifier,
};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Connect => cmd_connect(&config, format).await,
        Command::Submit(args) => cmd_submit(&config, format, args).await,
        Command::Approve(args) => cmd_approve(&config, format, args).await,
        Command::Show(args) => cmd_show(&config, format, args).await,
        Command::Count => cmd_count(&config, format).await,
        Command::List => cmd_list(&config, format).await,
        Command::Upload(args) => cmd_upload(&config, format, args).await,
        Command::Links(args) => cmd_links(&config, format, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    Ok(config.apply_env()?)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Start a wallet session and connect it; fails if no account is granted.
async fn open_session(config: &ClientConfig) -> anyhow::Result<WalletSession> {
    let wallet = JsonRpcWallet::connect(config.signer_url.as_str())
        .with_context(|| format!("wallet endpoint {}", config.signer_url))?;
    let provider: Arc<dyn WalletProvider> = wallet.into_shared();
    let session = WalletSession::start(Some(provider), config.chain.clone()).await;
    if session.identity().is_none() {
        session.connect().await;
    }
    if session.identity().is_none() {
        let reason = session
            .last_error()
            .unwrap_or_else(|| "wallet granted no account".to_string());
        bail!("wallet not connected: {reason}");
    }
    Ok(session)
}

async fn writable_verifier(config: &ClientConfig) -> anyhow::Result<(WorkVerifier, WalletSession)> {
    let session = open_session(config).await?;
    let verifier = WorkVerifier::from_config(config, session.provider())?;
    Ok((verifier, session))
}

fn read_only_verifier(config: &ClientConfig) -> anyhow::Result<WorkVerifier> {
    Ok(WorkVerifier::from_config(config, None)?)
}

async fn cmd_connect(config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let session = open_session(config).await?;
    let state = session.state();
    if format == OutputFormat::Json {
        return print_json(&json!({
            "identity": state.identity,
            "network": state.network,
            "on_expected_network": session.on_expected_network(),
        }));
    }
    println!("{} Wallet connected", "✓".green().bold());
    if let Some(identity) = state.identity {
        println!("  Account: {}", identity.to_string().cyan());
    }
    match state.network {
        Some(chain) if session.on_expected_network() => {
            println!(
                "  Network: {} ({})",
                config.chain.chain_name,
                chain.value().to_string().green()
            )
        }
        Some(chain) => println!(
            "  Network: {} {}",
            chain.value().to_string().yellow(),
            format!("(expected {})", config.chain.chain_name).dimmed()
        ),
        None => println!("  Network: {}", "unknown".yellow()),
    }
    Ok(())
}

async fn cmd_submit(
    config: &ClientConfig,
    format: OutputFormat,
    args: SubmitArgs,
) -> anyhow::Result<()> {
    let (verifier, _session) = writable_verifier(config).await?;
    let file = FileUpload::from_path(&args.file).await?;
    let outcome = verifier.submit(&args.title, file).await?;

    let tx_url = verifier.receipt_url(&outcome.receipt.tx_hash);
    let content_url = verifier.content_url(&outcome.cid);
    if format == OutputFormat::Json {
        return print_json(&json!({
            "id": outcome.receipt.submission_id,
            "cid": outcome.cid,
            "tx_hash": outcome.receipt.tx_hash,
            "content_url": content_url,
            "tx_url": tx_url,
        }));
    }
    println!(
        "{} Submitted {} as {}",
        "✓".green().bold(),
        args.title.bold(),
        outcome.receipt.submission_id.to_string().yellow()
    );
    println!("  CID: {}", outcome.cid.as_str().cyan());
    println!("  Content: {}", content_url.blue());
    println!("  Transaction: {}", tx_url.blue());
    Ok(())
}

async fn cmd_approve(
    config: &ClientConfig,
    format: OutputFormat,
    args: IdArgs,
) -> anyhow::Result<()> {
    let (verifier, _session) = writable_verifier(config).await?;
    let receipt = verifier.approve(SubmissionId(args.id)).await?;
    let tx_url = verifier.receipt_url(&receipt.tx_hash);
    if format == OutputFormat::Json {
        return print_json(&json!({
            "id": receipt.submission_id,
            "tx_hash": receipt.tx_hash,
            "tx_url": tx_url,
        }));
    }
    println!(
        "{} Approved {}. Tx: {}",
        "✓".green().bold(),
        receipt.submission_id.to_string().yellow(),
        receipt.tx_hash.short()
    );
    println!("  Transaction: {}", tx_url.blue());
    Ok(())
}

async fn cmd_show(config: &ClientConfig, format: OutputFormat, args: IdArgs) -> anyhow::Result<()> {
    let verifier = read_only_verifier(config)?;
    let verification = verifier.verify(SubmissionId(args.id)).await?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&verification)?);
    }
    let s = &verification.submission;
    println!("{} {}", s.id.to_string().yellow().bold(), s.title.bold());
    println!("  Status:    {}", status_label(s));
    println!("  Student:   {}", s.student);
    println!("  Submitted: {}", s.submitted_at);
    if let Some(mentor) = s.mentor() {
        println!("  Mentor:    {mentor}");
        println!("  Approved:  {}", s.approved_at);
    }
    println!("  CID:       {}", s.cid.as_str().cyan());
    println!("  Content:   {}", verification.content_url.blue());
    Ok(())
}

async fn cmd_count(config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let count = read_only_verifier(config)?.fetch_count().await?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "count": count }));
    }
    println!("{count}");
    Ok(())
}

async fn cmd_list(config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let submissions = read_only_verifier(config)?.fetch_all().await?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&submissions)?);
    }
    if submissions.is_empty() {
        println!("No submissions.");
        return Ok(());
    }
    for s in &submissions {
        println!(
            "{} {} {} {}",
            s.id.to_string().yellow(),
            status_label(s),
            s.student.short().dimmed(),
            s.title
        );
    }
    Ok(())
}

async fn cmd_upload(
    config: &ClientConfig,
    format: OutputFormat,
    args: UploadArgs,
) -> anyhow::Result<()> {
    let uploader = ProxyUploader::new(&config.upload_url)?;
    let file = FileUpload::from_path(&args.file).await?;
    if file.is_empty() {
        bail!("{} is empty", args.file.display());
    }
    let cid = uploader.upload(file).await?;
    let content_url = config.links().cid_url(&cid);
    if format == OutputFormat::Json {
        return print_json(&json!({ "cid": cid, "content_url": content_url }));
    }
    println!("{} Pinned {}", "✓".green().bold(), cid.as_str().cyan());
    println!("  Content: {}", content_url.blue());
    Ok(())
}

fn cmd_links(config: &ClientConfig, format: OutputFormat, args: LinksArgs) -> anyhow::Result<()> {
    if args.cid.is_none() && args.tx.is_none() {
        bail!("pass --cid and/or --tx");
    }
    let links = config.links();
    let content_url = args.cid.as_deref().map(|cid| links.content_url(cid));
    let tx_url = args.tx.as_deref().map(|tx| links.receipt_url(tx));
    if format == OutputFormat::Json {
        return print_json(&json!({ "content_url": content_url, "tx_url": tx_url }));
    }
    if let Some(url) = content_url {
        println!("Content:     {}", url.blue());
    }
    if let Some(url) = tx_url {
        println!("Transaction: {}", url.blue());
    }
    Ok(())
}

fn status_label(s: &Submission) -> colored::ColoredString {
    if s.approved {
        "approved".green()
    } else {
        "pending".yellow()
    }
}
