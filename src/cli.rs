use clap::Parser;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: generate-inventory --list";

#[derive(Parser, Debug)]
#[command(
    name = "generate-inventory",
    version,
    about = "Ansible dynamic inventory for libvirt-hosted Talos cluster VMs"
)]
pub struct Cli {
    /// Discover VM addresses and print the inventory as JSON
    #[arg(long)]
    pub list: bool,

    /// Path to config file (default: ~/.config/talos-inventory/inventory.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log discovery progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
