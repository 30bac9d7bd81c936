use std::path::Path;

use anyhow::{Context, Result};
use swapplan::{
    app::{self, RunOutcome},
    options::{
        args, get_config_path, get_or_create_config, init_options, SwapCommand, SwapOptions,
    },
    prompt::{AssumeYes, TerminalPrompter},
    system::HostBackend,
    utils::{general::is_root, logging::init_logger},
};

fn run(options: &SwapOptions) -> Result<RunOutcome> {
    let backend = HostBackend;

    let outcome = match options.command {
        SwapCommand::Apply {
            assume_yes: true, ..
        } => app::run(options, &backend, &AssumeYes),
        _ => app::run(options, &backend, &TerminalPrompter),
    };

    Ok(outcome?)
}

fn main() -> Result<()> {
    let args = args::get_args();

    let config = {
        let config_path =
            get_config_path(args.general_args.config_location.as_deref().map(Path::new));
        get_or_create_config(config_path.as_deref())
            .context("Unable to properly parse or create the config file.")?
    };

    let options =
        init_options(args, &config).context("Found an issue while trying to build the options.")?;

    let level = if options.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    init_logger(level, options.log_file.as_deref(), options.verbose)
        .context("Unable to set up logging.")?;

    app::check_privileges(&options, is_root())?;

    let outcome = run(&options)?;
    println!("{outcome}");

    Ok(())
}
