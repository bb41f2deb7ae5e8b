mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use fwpause_cloud::FirewallApi;
use fwpause_cloud_azure::{AzureBlobClient, AzureProvider};
use fwpause_core::{Settings, SettingsInput, StorageMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fwpause", version)]
#[command(
    about = "Pause and resume an Azure Firewall while keeping its private IP",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// IP 構成を保存してから削除（課金停止）
    Pause,
    /// 保存した IP 構成を再作成し、必要ならルートを更新
    Resume,
    /// 現在の状態を表示（読み取りのみ）
    Status,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Resource group of the firewall
    #[arg(long = "rg", global = true, env = "FW_RESOURCE_GROUP")]
    resource_group: Option<String>,

    /// Firewall name
    #[arg(long = "fw", global = true, env = "FW_NAME")]
    firewall_name: Option<String>,

    /// Resource group of the virtual network (defaults to --rg)
    #[arg(long = "vnet-rg", global = true, env = "FW_VNET_RESOURCE_GROUP")]
    vnet_resource_group: Option<String>,

    /// Virtual network name
    #[arg(long = "vnet", global = true, env = "FW_VNET")]
    vnet_name: Option<String>,

    /// Firewall subnet name
    #[arg(long = "subnet", global = true, env = "FW_SUBNET")]
    subnet_name: Option<String>,

    /// Local snapshot path (storage mode local)
    #[arg(long = "config", global = true, env = "FW_CONFIG")]
    config_path: Option<PathBuf>,

    /// CSV of routes to repoint when the private IP changes
    #[arg(long = "udr-csv", global = true, env = "FW_UDR_CSV")]
    udr_csv: Option<PathBuf>,

    /// Where to keep the snapshot
    #[arg(
        long = "storage-mode",
        global = true,
        env = "FW_STORAGE_MODE",
        value_enum,
        default_value_t = StorageModeArg::Local
    )]
    storage_mode: StorageModeArg,

    /// Storage account (storage mode azure)
    #[arg(long = "storage-account", global = true, env = "FW_STORAGE_ACCOUNT")]
    storage_account: Option<String>,

    /// Blob container (storage mode azure)
    #[arg(long = "storage-container", global = true, env = "FW_STORAGE_CONTAINER")]
    storage_container: Option<String>,

    /// Describe every change without making it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StorageModeArg {
    Local,
    Azure,
}

impl From<StorageModeArg> for StorageMode {
    fn from(mode: StorageModeArg) -> Self {
        match mode {
            StorageModeArg::Local => StorageMode::Local,
            StorageModeArg::Azure => StorageMode::Azure,
        }
    }
}

impl GlobalArgs {
    fn into_input(self) -> SettingsInput {
        SettingsInput {
            resource_group: self.resource_group,
            firewall_name: self.firewall_name,
            vnet_resource_group: self.vnet_resource_group,
            vnet_name: self.vnet_name,
            subnet_name: self.subnet_name,
            config_path: self.config_path,
            udr_csv: self.udr_csv,
            storage_mode: self.storage_mode.into(),
            storage_account: self.storage_account,
            storage_container: self.storage_container,
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // help / version は exit 0、それ以外の解析エラーは exit 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// ログは stderr へ。RUST_LOG があればそれを優先
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fwpause={level},fwpause_core={level},fwpause_cloud={level},fwpause_cloud_azure={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command;
    let settings = Settings::resolve(cli.global.into_input()).map_err(fwpause_core::Error::from)?;
    tracing::debug!("Settings: {:?}", settings);

    let provider = AzureProvider::new();
    let store = fwpause_core::store::from_settings(&settings, |account| {
        AzureBlobClient::new(account)
    });

    if settings.dry_run {
        println!(
            "{}",
            "[DRY RUN] No changes will be made to the firewall, routes or storage".cyan()
        );
    } else {
        preflight(&provider).await?;
    }

    match command {
        Commands::Pause => commands::pause::handle(&settings, &provider, store.as_ref()).await,
        Commands::Resume => commands::resume::handle(&settings, &provider, store.as_ref()).await,
        Commands::Status => commands::status::handle(&settings, &provider, store.as_ref()).await,
    }
}

/// az のログイン確認
async fn preflight(api: &dyn FirewallApi) -> anyhow::Result<()> {
    tracing::debug!("Checking {} authentication", api.name());
    let auth = api.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "Azure CLI is not ready: {}",
            auth.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    if let Some(account) = auth.account_info {
        tracing::info!("Signed in as {}", account);
    }
    Ok(())
}

fn report_error(error: &anyhow::Error) {
    eprintln!();
    eprintln!("{} {}", "Error:".red().bold(), error);

    let hint = error
        .downcast_ref::<fwpause_core::Error>()
        .and_then(fwpause_core::Error::hint);
    if let Some(hint) = hint {
        eprintln!("{} {}", "Hint:".yellow().bold(), hint);
    }
}
