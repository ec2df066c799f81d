//! Configuration management for the highlighter

use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::Result;
use crate::interaction::Key;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HighlighterConfig {
    pub stability: StabilityConfig,
    pub restore: RestoreConfig,
    pub url: UrlConfig,
    pub render: RenderConfig,
    pub interaction: InteractionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Quiet period that counts as stable, in milliseconds
    pub quiet_period_ms: u64,
    /// Hard ceiling on the wait, in milliseconds
    pub ceiling_ms: u64,
    /// Poll interval, in milliseconds
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Delay between individual restores, in milliseconds
    pub stagger_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub tracking_params: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,
    /// CSS class prefix for marks and native highlight names
    pub class_prefix: String,
    /// Data attribute carrying the highlight id on marks
    pub id_attribute: String,
    /// Whether marks carry an inline background color
    pub inline_styles: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Modifier that arms click-to-remove
    pub modifier: Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Native highlights when available, marks otherwise
    #[default]
    Auto,
    Native,
    Marks,
}

pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "ref",
];

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 150,
            ceiling_ms: 5_000,
            poll_interval_ms: 50,
        }
    }
}

impl StabilityConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { stagger_ms: 10 }
    }
}

impl RestoreConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            tracking_params: DEFAULT_TRACKING_PARAMS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Auto,
            class_prefix: "hl".to_string(),
            id_attribute: "data-highlight-id".to_string(),
            inline_styles: true,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { modifier: Key::Alt }
    }
}

fn env_ms(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl HighlighterConfig {
    /// Read `PAGE_ANCHOR_*` variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        HighlighterConfig {
            stability: StabilityConfig {
                quiet_period_ms: env_ms(
                    "PAGE_ANCHOR_QUIET_PERIOD_MS",
                    defaults.stability.quiet_period_ms,
                ),
                ceiling_ms: env_ms("PAGE_ANCHOR_CEILING_MS", defaults.stability.ceiling_ms),
                poll_interval_ms: env_ms(
                    "PAGE_ANCHOR_POLL_INTERVAL_MS",
                    defaults.stability.poll_interval_ms,
                ),
            },
            restore: RestoreConfig {
                stagger_ms: env_ms("PAGE_ANCHOR_STAGGER_MS", defaults.restore.stagger_ms),
            },
            url: UrlConfig {
                tracking_params: env::var("PAGE_ANCHOR_TRACKING_PARAMS")
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or(defaults.url.tracking_params),
            },
            render: RenderConfig {
                mode: match env::var("PAGE_ANCHOR_RENDER_MODE")
                    .unwrap_or_default()
                    .to_lowercase()
                    .as_str()
                {
                    "native" => RenderMode::Native,
                    "marks" => RenderMode::Marks,
                    _ => RenderMode::Auto,
                },
                class_prefix: env::var("PAGE_ANCHOR_CLASS_PREFIX")
                    .unwrap_or(defaults.render.class_prefix),
                id_attribute: env::var("PAGE_ANCHOR_ID_ATTRIBUTE")
                    .unwrap_or(defaults.render.id_attribute),
                inline_styles: env::var("PAGE_ANCHOR_INLINE_STYLES")
                    .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                    .unwrap_or(defaults.render.inline_styles),
            },
            interaction: InteractionConfig {
                modifier: env::var("PAGE_ANCHOR_MODIFIER")
                    .map(|v| Key::from_name(v.trim()))
                    .unwrap_or(defaults.interaction.modifier),
            },
        }
    }

    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
