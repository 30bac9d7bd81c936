use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SwapConfig {
    pub(crate) file: Option<String>,
    pub(crate) swappiness: Option<u8>,
    pub(crate) min_size_mb: Option<u64>,
}
