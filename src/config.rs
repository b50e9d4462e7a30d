use serde::{Deserialize, Serialize};

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_NAME_LEN: usize = 32;

/// Rule variant knobs applied by every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    /// Ordinary pieces may capture backwards. Plain steps are always forward only.
    pub backward_captures: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            backward_captures: true,
        }
    }
}

/// Settings for the match registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CenterConfig {
    /// A match with no activity for this long is resigned by the side to move.
    pub idle_timeout_secs: u64,
    pub max_name_len: usize,
    pub rules: RuleConfig,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            rules: RuleConfig::default(),
        }
    }
}
