//! aegis: provision and tear down the aegis AWS topology
//!
//! `aegis provision` creates (or reuses) the key, bucket, table, worker role
//! and worker instance, then prints the worker's public IP. `aegis cleanup`
//! removes all of it and always exits zero.

use aegis_common::defaults::{
    DEFAULT_AMI_PARAMETER, DEFAULT_BILLING_MODE, DEFAULT_BUCKET_NAME,
    DEFAULT_INSTANCE_PROFILE_NAME, DEFAULT_INSTANCE_TYPE, DEFAULT_KEY_ALIAS,
    DEFAULT_KEY_PAIR_NAME, DEFAULT_POLICY_NAME, DEFAULT_REGION, DEFAULT_ROLE_NAME,
    DEFAULT_SECURITY_GROUP_NAME, DEFAULT_SSH_CIDR, DEFAULT_TABLE_NAME, WORKER_USER_DATA,
};
use aegis_provisioner::aws::{AwsClients, AwsContext, FromAwsContext, resolve_account_id};
use aegis_provisioner::config;
use aegis_provisioner::orchestrator::Orchestrator;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(about = "Idempotent provisioning of the aegis AWS infrastructure")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Resource names and settings shared by both commands
#[derive(clap::Args, Debug)]
struct InfraArgs {
    /// AWS region
    #[arg(long, env = "AEGIS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Account ID used in ARNs (default: looked up via STS)
    #[arg(long, env = "AEGIS_ACCOUNT_ID")]
    account_id: Option<String>,

    /// KMS alias of the master key
    #[arg(long, env = "AEGIS_KEY_ALIAS", default_value = DEFAULT_KEY_ALIAS)]
    key_alias: String,

    /// S3 bucket name
    #[arg(long, env = "AEGIS_BUCKET", default_value = DEFAULT_BUCKET_NAME)]
    bucket: String,

    /// DynamoDB audit table name
    #[arg(long, env = "AEGIS_TABLE", default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// DynamoDB billing mode
    #[arg(long, env = "AEGIS_BILLING_MODE", default_value = DEFAULT_BILLING_MODE)]
    billing_mode: String,

    /// IAM role assumed by the worker
    #[arg(long, env = "AEGIS_ROLE", default_value = DEFAULT_ROLE_NAME)]
    role: String,

    /// IAM instance profile wrapping the role
    #[arg(long, env = "AEGIS_INSTANCE_PROFILE", default_value = DEFAULT_INSTANCE_PROFILE_NAME)]
    instance_profile: String,

    /// Name of the inline permission policy
    #[arg(long, env = "AEGIS_POLICY_NAME", default_value = DEFAULT_POLICY_NAME)]
    policy_name: String,

    /// EC2 key pair name
    #[arg(long, env = "AEGIS_KEY_PAIR", default_value = DEFAULT_KEY_PAIR_NAME)]
    key_pair: String,

    /// Security group name
    #[arg(long, env = "AEGIS_SECURITY_GROUP", default_value = DEFAULT_SECURITY_GROUP_NAME)]
    security_group: String,

    /// CIDR allowed to SSH into the worker
    #[arg(long, env = "AEGIS_SSH_CIDR", default_value = DEFAULT_SSH_CIDR)]
    ssh_cidr: String,

    /// SSM parameter holding the worker AMI id
    #[arg(long, env = "AEGIS_AMI_PARAMETER", default_value = DEFAULT_AMI_PARAMETER)]
    ami_parameter: String,

    /// Worker instance type
    #[arg(long, env = "AEGIS_INSTANCE_TYPE", default_value = DEFAULT_INSTANCE_TYPE)]
    instance_type: String,

    /// Directory receiving the key pair's private key
    #[arg(long, env = "AEGIS_KEY_DIR", default_value = ".")]
    key_dir: PathBuf,
}

impl From<InfraArgs> for config::InfraConfig {
    fn from(args: InfraArgs) -> Self {
        Self {
            aws: config::AwsConfig {
                region: args.region,
                aws_profile: args.aws_profile,
                account_id: args.account_id,
            },
            storage: config::StorageConfig {
                key_alias: args.key_alias,
                bucket: args.bucket,
                table: args.table,
                billing_mode: args.billing_mode,
            },
            identity: config::IdentityConfig {
                role: args.role,
                instance_profile: args.instance_profile,
                policy_name: args.policy_name,
            },
            compute: config::ComputeConfig {
                key_pair: args.key_pair,
                security_group: args.security_group,
                ssh_cidr: args.ssh_cidr,
                ami_parameter: args.ami_parameter,
                instance_type: args.instance_type,
                key_dir: args.key_dir,
                user_data: WORKER_USER_DATA.to_string(),
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or reuse every resource and start the worker
    Provision(InfraArgs),

    /// Delete every resource, tolerating ones already gone
    Cleanup(InfraArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_tracing() {
    // Reduce noise from AWS SDK (show only warnings and errors)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,aws_config=warn,aws_sdk=warn,aws_smithy=warn")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    match args.command {
        Command::Provision(infra) => handle_provision(infra.into()).await,
        Command::Cleanup(infra) => handle_cleanup(infra.into()).await,
    }
}

/// Load the SDK context for the configured region and profile
async fn connect(config: &config::InfraConfig) -> AwsContext {
    if let Some(profile) = config.aws_profile() {
        info!(profile = %profile, "Using AWS profile");
    }
    AwsContext::with_profile(config.region(), config.aws_profile()).await
}

async fn handle_provision(config: config::InfraConfig) -> Result<()> {
    info!(region = %config.region(), "Provisioning aegis infrastructure");
    let ctx = connect(&config).await;
    let account_id = resolve_account_id(&ctx, config.account_id()).await?;
    let clients = AwsClients::from_context(&ctx);

    let infra = Orchestrator::new(&clients, &config)
        .with_account_id(account_id)
        .provision()
        .await?;

    println!("\n=== Provisioned ===");
    println!("Key:              {} ({})", infra.key_id, infra.key_arn);
    println!("Bucket:           {}", infra.bucket_arn);
    println!("Table:            {}", infra.table_arn);
    println!("Instance profile: {}", infra.instance_profile);
    println!("Private key:      {}", config.key_file().display());
    println!("Worker public IP: {}", infra.public_ip);

    Ok(())
}

async fn handle_cleanup(config: config::InfraConfig) -> Result<()> {
    info!(region = %config.region(), "Cleaning up aegis infrastructure");
    let ctx = connect(&config).await;
    let clients = AwsClients::from_context(&ctx);

    let report = Orchestrator::new(&clients, &config).cleanup().await;

    println!("\n=== Cleanup Report ===");
    println!("Region: {}", config.region());
    println!("Result: {report}");
    for (kind, id) in &report.failures {
        println!("  failed: {kind} {id}");
    }

    Ok(())
}
