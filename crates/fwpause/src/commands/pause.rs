use super::print_target;
use colored::Colorize;
use fwpause_cloud::FirewallApi;
use fwpause_core::{ConfigStore, DeallocateOutcome, Orchestrator, PauseOutcome, Settings};

pub async fn handle(
    settings: &Settings,
    api: &dyn FirewallApi,
    store: &dyn ConfigStore,
) -> anyhow::Result<()> {
    print_target("Pausing", settings);

    let outcome = Orchestrator::new(settings, api, store).pause().await?;

    let (snapshot, saved_to, deallocation) = match outcome {
        PauseOutcome::AlreadyPaused => {
            println!();
            println!(
                "{}",
                "ℹ Firewall has no IP configurations; it is already paused".dimmed()
            );
            return Ok(());
        }
        PauseOutcome::Paused {
            snapshot,
            saved_to,
            deallocation,
        } => (snapshot, saved_to, deallocation),
    };

    println!();
    if settings.dry_run {
        println!("[DRY RUN] Configuration would be saved to {}", saved_to.cyan());
    } else {
        println!("{} Configuration saved to {}", "✓".green(), saved_to.cyan());
    }
    for entry in snapshot.entries() {
        println!(
            "  {} private {} public {}",
            entry.name.bold(),
            entry.private_address.as_deref().unwrap_or("-"),
            entry.public_ip_name().unwrap_or("-")
        );
    }
    if let Some(saved_at) = snapshot.saved_at {
        let local = saved_at.with_timezone(&chrono::Local);
        println!("  saved at {}", local.format("%Y-%m-%d %H:%M:%S %Z"));
    }

    println!();
    match deallocation {
        DeallocateOutcome::Completed { removed, waited } => {
            println!(
                "{}",
                format!(
                    "✓ Firewall paused (removed {}, {}s)",
                    removed.join(", "),
                    waited.as_secs()
                )
                .green()
                .bold()
            );
        }
        DeallocateOutcome::TimedOut { removed, waited } => {
            println!(
                "{}",
                format!(
                    "⚠ Removal of {} was requested, but IP configurations were still present after {}s",
                    removed.join(", "),
                    waited.as_secs()
                )
                .yellow()
                .bold()
            );
            println!("  Check progress with 'fwpause status'");
        }
        DeallocateOutcome::DryRun { would_remove } => {
            println!("[DRY RUN] Would remove: {}", would_remove.join(", ").cyan());
        }
        DeallocateOutcome::NothingToDo => {
            println!(
                "{}",
                "ℹ IP configurations disappeared before removal; nothing left to remove".dimmed()
            );
        }
    }

    Ok(())
}
