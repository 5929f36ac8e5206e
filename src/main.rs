use clap::Parser;
use clap::error::ErrorKind;

use talos_inventory::backend::virsh::VirshBackend;
use talos_inventory::cli::{Cli, USAGE};
use talos_inventory::inventory::{self, Inventory};
use talos_inventory::{config, logging, poll};

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) if cli.list => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Ok(_) | Err(_) => {
            println!("{USAGE}");
            std::process::exit(1);
        }
    };

    let file_handle = logging::init(cli.verbose);

    let settings = config::resolve_settings(cli.config.as_deref())?;

    if let Some(path) = &settings.log_file
        && let Err(e) = file_handle.set_file(path)
    {
        tracing::warn!(path = %path.display(), "cannot open log file: {e}");
    }

    let backend = VirshBackend::new(&settings);
    let addresses = poll::wait_for_addresses(&backend, &settings).await;

    if !inventory::has_addresses(&addresses) {
        tracing::warn!("no VM addresses discovered");
        std::process::exit(1);
    }

    let document = Inventory::from_addresses(&addresses, &settings).to_json()?;
    println!("{document}");
    Ok(())
}
