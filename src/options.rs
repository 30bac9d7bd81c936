//! How to handle config files and arguments.

pub mod args;
pub mod config;
mod error;

use std::{
    fs,
    path::{Path, PathBuf},
};

pub use self::error::OptionError;
pub(crate) use self::error::OptionResult;
use self::{
    args::{Args, CommandArgs},
    config::Config,
};
use crate::constants::*;

/// What the user asked swapplan to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapCommand {
    Plan {
        size: Option<String>,
        memory_mb: Option<u64>,
        current_swap_mb: Option<u64>,
    },
    Apply {
        size: Option<String>,
        assume_yes: bool,
    },
    Status,
}

/// Everything a run needs, after merging arguments, the config file and the
/// built-in defaults, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOptions {
    pub command: SwapCommand,
    pub swap_file: PathBuf,
    pub fstab: PathBuf,
    pub fstab_backup: PathBuf,
    pub sysctl_conf: PathBuf,
    pub lock_file: PathBuf,
    pub log_file: Option<PathBuf>,
    pub swappiness: u8,
    pub min_size_mb: u64,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Returns the config path to use. If `override_config_path` is [`None`],
/// this falls back to the user's config directory.
pub fn get_config_path(override_config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(conf_loc) = override_config_path {
        return Some(conf_loc.to_path_buf());
    }

    dirs::config_dir().map(|path| path.join(DEFAULT_CONFIG_FILE_LOCATION))
}

/// Get the config at `config_path`. If there is no config file at the specified
/// path, it will try to create a new file with the default settings, and return
/// the default config.
pub fn get_or_create_config(config_path: Option<&Path>) -> OptionResult<Config> {
    let Some(path) = config_path else {
        return Ok(Config::default());
    };

    if let Ok(config_string) = fs::read_to_string(path) {
        Ok(toml_edit::de::from_str(&config_string)?)
    } else {
        if let Some(parent_path) = path.parent() {
            fs::create_dir_all(parent_path)?;
        }

        fs::write(path, CONFIG_TEXT)?;
        Ok(Config::default())
    }
}

/// Where a value came from, so errors can point at the right place.
enum Source<'a> {
    Arg(&'a str),
    Config(&'a str),
    Default,
}

/// Picks the argument, then the config value, then the default.
fn pick<'a>(
    arg: (&'a str, Option<&'a str>), config: (&'a str, Option<&'a str>), default: &'a str,
) -> (&'a str, Source<'a>) {
    match (arg.1, config.1) {
        (Some(value), _) => (value, Source::Arg(arg.0)),
        (None, Some(value)) => (value, Source::Config(config.0)),
        (None, None) => (default, Source::Default),
    }
}

fn invalid(source: &Source<'_>, reason: &str) -> OptionError {
    match source {
        Source::Arg(name) => OptionError::invalid_arg_value(name, reason),
        Source::Config(key) => OptionError::invalid_config_value(key, reason),
        Source::Default => OptionError::config(reason.to_string()),
    }
}

/// Paths must be absolute, and the swap file also ends up in the mount table,
/// where whitespace separates fields.
fn get_path(value: &str, source: &Source<'_>, allow_whitespace: bool) -> OptionResult<PathBuf> {
    if value.is_empty() {
        return Err(invalid(source, "cannot be empty"));
    }

    let path = PathBuf::from(value);
    if !path.is_absolute() {
        return Err(invalid(source, &format!("must be an absolute path, not '{value}'")));
    }

    if !allow_whitespace && value.chars().any(char::is_whitespace) {
        return Err(invalid(source, &format!("cannot contain whitespace, got '{value}'")));
    }

    Ok(path)
}

fn get_swappiness(args: &Args, config: &Config) -> OptionResult<u8> {
    let (swappiness, source) = match (
        args.general_args.swappiness,
        config.swap.as_ref().and_then(|swap| swap.swappiness),
    ) {
        (Some(value), _) => (value, Source::Arg("swappiness")),
        (None, Some(value)) => (value, Source::Config("swappiness")),
        (None, None) => (DEFAULT_SWAPPINESS, Source::Default),
    };

    if swappiness > 100 {
        return Err(invalid(
            &source,
            &format!("must be between 0 and 100, got {swappiness}"),
        ));
    }

    Ok(swappiness)
}

fn get_min_size_mb(config: &Config) -> OptionResult<u64> {
    match config.swap.as_ref().and_then(|swap| swap.min_size_mb) {
        Some(min_size_mb) if min_size_mb < MIN_SWAP_SIZE_MB => Err(OptionError::invalid_config_value(
            "min_size_mb",
            &format!("cannot be below {MIN_SWAP_SIZE_MB}, got {min_size_mb}"),
        )),
        Some(min_size_mb) => Ok(min_size_mb),
        None => Ok(MIN_SWAP_SIZE_MB),
    }
}

/// Merges `args` and `config` into the [`SwapOptions`] for this run.
pub fn init_options(args: Args, config: &Config) -> OptionResult<SwapOptions> {
    let general = &args.general_args;
    let swap = config.swap.clone().unwrap_or_default();
    let paths = config.paths.clone().unwrap_or_default();
    let general_config = config.general.clone().unwrap_or_default();

    let (value, source) = pick(
        ("swap-file", general.swap_file.as_deref()),
        ("file", swap.file.as_deref()),
        DEFAULT_SWAP_FILE,
    );
    let swap_file = get_path(value, &source, false)?;

    let (value, source) = pick(
        ("fstab", general.fstab.as_deref()),
        ("fstab", paths.fstab.as_deref()),
        DEFAULT_FSTAB,
    );
    let fstab = get_path(value, &source, true)?;

    let fstab_backup = match paths.fstab_backup.as_deref() {
        Some(value) => get_path(value, &Source::Config("fstab_backup"), true)?,
        None => {
            let mut backup = fstab.clone().into_os_string();
            backup.push(FSTAB_BACKUP_SUFFIX);
            PathBuf::from(backup)
        }
    };

    let (value, source) = pick(
        ("sysctl-conf", general.sysctl_conf.as_deref()),
        ("sysctl_conf", paths.sysctl_conf.as_deref()),
        DEFAULT_SYSCTL_CONF,
    );
    let sysctl_conf = get_path(value, &source, true)?;

    let (value, source) = pick(
        ("lock-file", general.lock_file.as_deref()),
        ("lock_file", paths.lock_file.as_deref()),
        DEFAULT_LOCK_FILE,
    );
    let lock_file = get_path(value, &source, true)?;

    let log_file = match (general.log_file.as_deref(), general_config.log_file.as_deref()) {
        (Some(value), _) => Some(get_path(value, &Source::Arg("log-file"), true)?),
        (None, Some(value)) => Some(get_path(value, &Source::Config("log_file"), true)?),
        (None, None) => None,
    };

    let swappiness = get_swappiness(&args, config)?;
    let min_size_mb = get_min_size_mb(config)?;
    let config_dry_run = general_config.dry_run.unwrap_or(false);

    let (command, dry_run) = match args.command {
        CommandArgs::Plan(plan) => (
            SwapCommand::Plan {
                size: plan.size,
                memory_mb: plan.memory,
                current_swap_mb: plan.current_swap,
            },
            false,
        ),
        CommandArgs::Apply(apply) => (
            SwapCommand::Apply {
                size: apply.size,
                assume_yes: apply.yes,
            },
            apply.dry_run || config_dry_run,
        ),
        CommandArgs::Status => (SwapCommand::Status, false),
    };

    if let SwapCommand::Plan {
        memory_mb: Some(0), ..
    } = command
    {
        return Err(OptionError::invalid_arg_value("memory", "must be greater than 0"));
    }

    Ok(SwapOptions {
        command,
        swap_file,
        fstab,
        fstab_backup,
        sysctl_conf,
        lock_file,
        log_file,
        swappiness,
        min_size_mb,
        dry_run,
        verbose: general.verbose,
    })
}
