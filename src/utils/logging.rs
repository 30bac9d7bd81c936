use std::path::Path;

/// Sets up logging for a run.
///
/// Records go to `log_file` if one is configured, which is where the
/// provisioning history of a host is kept. If `echo_stderr` is set they are
/// also written to stderr. If neither is wanted, no logger is installed and
/// the `log` macros are no-ops.
pub fn init_logger(
    min_level: log::LevelFilter, log_file: Option<&Path>, echo_stderr: bool,
) -> Result<(), fern::InitError> {
    if log_file.is_none() && !echo_stderr {
        return Ok(());
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // Local time is unsound to query once other threads may exist, so UTC it is.
            let offset = time::OffsetDateTime::now_utc();
            let timestamp = offset
                .format(&time::macros::format_description!(
                    // The weird "[[[" is because we need to escape a bracket ("[[") to show one "[".
                    // See https://time-rs.github.io/book/api/format-description.html
                    "[[[year]-[month]-[day]][[[hour]:[minute]:[second]]"
                ))
                .unwrap_or_default();

            out.finish(format_args!(
                "{}[{}][{}] {}",
                timestamp,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(min_level);

    if let Some(log_file) = log_file {
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        dispatch = dispatch.chain(fern::log_file(log_file)?);
    }

    if echo_stderr {
        dispatch = dispatch.chain(std::io::stderr());
    }

    dispatch.apply()?;

    Ok(())
}
