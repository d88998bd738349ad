mod args;
mod mx;
mod output;
mod verify;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};
use mailprobe_lib::verify_email;

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "mailprobe_lib=info,mailprobe_cli=info",
        _ => "mailprobe_lib=debug,mailprobe_cli=debug",
    };
    // RUST_LOG l'emporte sur -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = cli.probe.verify_options();
    let out = cli.out.as_deref();

    let all_ok = if cli.stdin {
        let addresses = verify::read_addresses(io::stdin().lock())?;
        let options = &options;
        let rows = verify::verify_all(addresses, cli.concurrency, move |address| async move {
            verify_email(&address, options).await
        })
        .await;
        output::write_reports(&rows, &cli.format, out)?;
        !verify::any_not_accepted(&rows)
    } else {
        match &cli.cmd {
            Some(Commands::Verify { email }) => {
                let rows = vec![verify_email(email, &options).await];
                output::write_reports(&rows, &cli.format, out)?;
                !verify::any_not_accepted(&rows)
            }
            Some(Commands::Mx { domain }) => {
                let rows = vec![mx::resolve(domain).await];
                output::write_reports(&rows, &cli.format, out)?;
                rows.iter().all(mx::MxSummary::has_records)
            }
            None => {
                Cli::clap_command().print_help()?;
                println!();
                return Ok(ExitCode::SUCCESS);
            }
        }
    };

    // codes de sortie : 0 OK, 2 non acceptée(s), 1 fatal
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
