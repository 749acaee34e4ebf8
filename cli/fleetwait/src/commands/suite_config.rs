//! Suite-config command (show settings read from the environment).

use anyhow::Result;
use clap::Args;
use fleetcheck_probes::SuiteConfig;
use serde::Serialize;
use tabled::Tabled;

use super::CommandContext;
use crate::output::{display_option, print_output, print_single, OutputFormat};

/// Suite-config command - print the parsed suite settings.
#[derive(Debug, Args)]
pub struct SuiteConfigCommand {}

/// One suite setting.
#[derive(Debug, Clone, Serialize, Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: &'static str,

    #[tabled(rename = "Value", display = "display_option")]
    value: Option<String>,
}

impl SuiteConfigCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match ctx.format {
            OutputFormat::Table => print_output(&setting_rows(&ctx.suite), ctx.format),
            OutputFormat::Json => print_single(&ctx.suite),
        }
        Ok(())
    }
}

fn setting_rows(suite: &SuiteConfig) -> Vec<SettingRow> {
    let release = suite.release.as_ref();
    let row = |key, value| SettingRow { key, value };
    vec![
        row("arch", suite.arch.clone()),
        row("cluster name", suite.cluster_name.clone()),
        row("management hostname", suite.management_hostname.clone()),
        row("downstream image tag", suite.downstream_image_tag.clone()),
        row("release channel", release.map(|r| r.channel.clone())),
        row("release version", release.and_then(|r| r.version.clone())),
        row("head version", release.and_then(|r| r.head_version.clone())),
        row("timeout scale", Some(suite.timeout_scale.to_string())),
    ]
}
