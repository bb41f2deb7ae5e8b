pub mod pause;
pub mod resume;
pub mod status;

use colored::Colorize;
use fwpause_core::Settings;

/// 対象ファイアウォールの見出し
pub fn print_target(action: &str, settings: &Settings) {
    println!(
        "{}",
        format!(
            "{} firewall '{}' (resource group '{}')",
            action, settings.firewall.name, settings.firewall.resource_group
        )
        .yellow()
    );
}
