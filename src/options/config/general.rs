use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeneralConfig {
    pub(crate) log_file: Option<String>,
    pub(crate) dry_run: Option<bool>,
}
