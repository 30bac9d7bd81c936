// Argument parsing via clap.
//
// Note that you probably want to keep this as a single file so the build script doesn't
// trip all over itself.

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}
    {author}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "swapplan [OPTIONS] <COMMAND>";

/// The arguments for swapplan.
#[derive(Parser, Debug)]
#[command(
    name = crate_name!(),
    version = crate_version!(),
    author = crate_authors!(),
    about = crate_description!(),
    disable_help_flag = true,
    disable_version_flag = true,
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
    subcommand_help_heading = "Commands",
)]
pub struct Args {
    #[command(subcommand)]
    pub command: CommandArgs,

    #[command(flatten)]
    pub general_args: GeneralArgs,

    #[command(flatten)]
    pub other_args: OtherArgs,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CommandArgs {
    /// Shows the recommended swap size for this host without changing anything.
    #[command(
        long_about = "Shows the recommended swap size and what applying it would do. Nothing on \
                      the host is changed. --memory and --current-swap plan for a hypothetical host."
    )]
    Plan(PlanArgs),

    /// Creates or resizes the swap file, then persists it.
    #[command(
        long_about = "Creates or resizes the swap file, adds it to the mount table and tunes \
                      swappiness. Asks before doing anything unless --size or --yes is given. \
                      Must run as root unless --dry-run is given."
    )]
    Apply(ApplyArgs),

    /// Shows the current swap setup of this host.
    Status,
}

#[derive(Args, Clone, Debug, Default)]
pub struct PlanArgs {
    #[arg(
        long,
        value_name = "MB",
        allow_hyphen_values = true,
        help = "Plans for this swap size instead of the recommendation.",
        long_help = "Plans for this swap size in MiB instead of the recommended one. Must be a whole \
                    number no smaller than the configured minimum."
    )]
    pub size: Option<String>,

    #[arg(
        long,
        value_name = "MB",
        help = "Plans as if the host had this much memory."
    )]
    pub memory: Option<u64>,

    #[arg(
        long,
        value_name = "MB",
        help = "Plans as if the host had this much active swap."
    )]
    pub current_swap: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ApplyArgs {
    #[arg(
        long,
        value_name = "MB",
        allow_hyphen_values = true,
        help = "Uses this swap size instead of the recommendation.",
        long_help = "Uses this swap size in MiB instead of the recommended one, without asking. Must \
                    be a whole number no smaller than the configured minimum."
    )]
    pub size: Option<String>,

    #[arg(
        short = 'y',
        long,
        action = ArgAction::SetTrue,
        help = "Accepts the recommended size without asking."
    )]
    pub yes: bool,

    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Shows what would be done without changing anything.",
        long_help = "Shows each step that would run without changing anything on the host. Does not \
                    need root. Can also be set with 'dry_run' in the config file."
    )]
    pub dry_run: bool,
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "General Options")]
pub struct GeneralArgs {
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        global = true,
        help = "Sets the location of the config file.",
        long_help = "Sets the location of the config file. Expects a config file in the TOML format. \
                    If it doesn't exist, a default config file is created at the path."
    )]
    pub config_location: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Sets the location of the swap file.",
        long_help = "Sets the location of the swap file. Must be an absolute path without \
                    whitespace. Defaults to /swapfile."
    )]
    pub swap_file: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Sets the location of the mount table. Defaults to /etc/fstab."
    )]
    pub fstab: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Sets the location of the sysctl config. Defaults to /etc/sysctl.conf."
    )]
    pub sysctl_conf: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Sets the location of the run lock. Defaults to /run/swapplan.lock."
    )]
    pub lock_file: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        global = true,
        help = "Also writes the log to this file."
    )]
    pub log_file: Option<String>,

    #[arg(
        long,
        value_name = "N",
        global = true,
        help = "Sets vm.swappiness, from 0 to 100. Defaults to 10."
    )]
    pub swappiness: Option<u8>,

    #[arg(
        short = 'v',
        long,
        action = ArgAction::SetTrue,
        global = true,
        help = "Logs what is being done to stderr."
    )]
    pub verbose: bool,
}

#[derive(Args, Clone, Debug, Default)]
#[command(next_help_heading = "Other Options")]
pub struct OtherArgs {
    #[arg(short = 'h', long, action = ArgAction::Help, help = "Prints help (see more info with '--help').")]
    help: Option<bool>,

    #[arg(short = 'V', long, action = ArgAction::Version, help = "Prints version information.")]
    version: Option<bool>,
}

/// Returns a [`Command`] based off of [`Args`].
pub fn build_app() -> Command {
    Args::command()
}

/// Returns an [`Args`].
pub fn get_args() -> Args {
    Args::parse()
}
