use super::print_target;
use colored::Colorize;
use fwpause_cloud::FirewallApi;
use fwpause_core::{
    Allocation, ConfigStore, Orchestrator, ReconcileReport, ResumeOutcome, RouteStatus,
    RoutesOutcome, Settings,
};

pub async fn handle(
    settings: &Settings,
    api: &dyn FirewallApi,
    store: &dyn ConfigStore,
) -> anyhow::Result<()> {
    print_target("Resuming", settings);

    let outcome = Orchestrator::new(settings, api, store).resume().await?;

    match outcome {
        ResumeOutcome::AlreadyRunning { observation } => {
            println!();
            println!(
                "{}",
                format!(
                    "ℹ Firewall already has {} IP configuration(s); it is already running",
                    observation.ip_configuration_count
                )
                .dimmed()
            );
        }
        ResumeOutcome::Resumed {
            allocation,
            loaded_from,
            routes,
            management_not_restored,
        } => {
            println!("Configuration loaded from {}", loaded_from.cyan());
            println!();
            print_allocation(&allocation, settings.dry_run);
            print_routes(&routes);

            if management_not_restored {
                println!();
                println!(
                    "{}",
                    "⚠ A management IP configuration was saved but not restored".yellow()
                );
                println!("  Recreate it manually if the firewall uses forced tunnelling");
            }
        }
    }

    Ok(())
}

fn print_allocation(allocation: &Allocation, dry_run: bool) {
    if dry_run {
        println!(
            "[DRY RUN] Would recreate IP configuration '{}' with public IP '{}'",
            allocation.name.cyan(),
            allocation.public_ip_name.cyan()
        );
        return;
    }

    let private_ip = allocation.private_ip.as_deref().unwrap_or("-");
    println!(
        "{}",
        format!(
            "✓ IP configuration '{}' restored with public IP '{}' ({}s)",
            allocation.name,
            allocation.public_ip_name,
            allocation.waited.as_secs()
        )
        .green()
        .bold()
    );

    match (allocation.changed_ip(), allocation.previous_ip.as_deref()) {
        (Some(new_ip), Some(old_ip)) => println!(
            "{}",
            format!("⚠ Private IP changed: {} → {}", old_ip, new_ip).yellow()
        ),
        _ if allocation.is_preserved() => {
            println!("{} Private IP preserved: {}", "✓".green(), private_ip)
        }
        _ => println!(
            "Private IP {} (no previous IP was recorded, routes were not checked)",
            private_ip
        ),
    }
}

fn print_routes(routes: &RoutesOutcome) {
    match routes {
        RoutesOutcome::Unchanged => {}
        RoutesOutcome::NoCsvConfigured { new_ip } => {
            println!();
            println!(
                "{}",
                format!(
                    "⚠ Routes pointing at the old private IP must be updated to {} manually",
                    new_ip
                )
                .yellow()
            );
            println!("  Pass --udr-csv to update them automatically");
        }
        RoutesOutcome::Reconciled(report) => print_report(report),
    }
}

fn print_report(report: &ReconcileReport) {
    println!();
    println!("Routes (next hop {}):", report.next_hop_ip.cyan());
    for outcome in &report.outcomes {
        match &outcome.status {
            RouteStatus::Updated => println!("  {} {}", "✓".green(), outcome.label),
            RouteStatus::DryRun => println!("  [DRY RUN] would update {}", outcome.label),
            RouteStatus::Failed(reason) => {
                println!("  {} {}: {}", "✗".red(), outcome.label, reason.red())
            }
        }
    }

    if report.failed() > 0 {
        println!(
            "{}",
            format!(
                "⚠ {} updated, {} failed; fix the failed routes manually",
                report.updated(),
                report.failed()
            )
            .yellow()
            .bold()
        );
    } else if report.updated() > 0 {
        println!(
            "{}",
            format!("✓ {} route(s) updated", report.updated())
                .green()
                .bold()
        );
    }
}
