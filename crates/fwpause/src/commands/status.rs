use super::print_target;
use colored::Colorize;
use fwpause_cloud::FirewallApi;
use fwpause_core::{ConfigStore, FirewallState, Orchestrator, Settings};

/// 状態表示のみ（読み取り専用、ストアにも触れない）
pub async fn handle(
    settings: &Settings,
    api: &dyn FirewallApi,
    store: &dyn ConfigStore,
) -> anyhow::Result<()> {
    print_target("Checking", settings);

    let observation = Orchestrator::new(settings, api, store).status().await?;

    println!();
    let state = observation.state();
    let state = match state {
        FirewallState::Running => state.to_string().green().bold(),
        FirewallState::Paused => state.to_string().yellow().bold(),
    };
    println!("State:              {}", state);
    println!(
        "Provisioning state: {}",
        observation.provisioning_state.as_deref().unwrap_or("unknown")
    );
    println!("IP configurations:  {}", observation.ip_configuration_count);
    for entry in observation.entries() {
        println!(
            "  - {:<24} private {:<15} public {}",
            entry.name,
            entry.private_address.as_deref().unwrap_or("-"),
            entry.public_ip_name().unwrap_or("-")
        );
    }
    match observation.management_public_ip_name() {
        Some(pip) => println!("Management config:  present (public IP {})", pip),
        None if observation.has_management_configuration() => {
            println!("Management config:  present")
        }
        None => println!("Management config:  {}", "none".dimmed()),
    }

    Ok(())
}
