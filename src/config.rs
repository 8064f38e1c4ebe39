//! # Configuration
//!
//! Configuration structures and validation for a reconciliation run. This
//! is the common interface between the CLI and the library core: the CLI
//! fills these in, `validate()` catches nonsense early, and the session
//! consumes them as-is.
//!
//! Defaults mirror the knobs the bot has always run with: 100 credits per
//! pass, batches of 3, reinforce up to level 2, refuse to fight pixels at
//! level 4 or above.

use std::path::PathBuf;

use crate::overlay::Stride;

/// Where and how to reach the canvas service.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Bearer token sent in the `authorization` header, if any.
    pub auth_token: Option<String>,
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("Endpoint URL must not be empty".to_string());
        }
        Ok(())
    }
}

/// How to load and place the overlay image.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Path to the overlay/target bitmap.
    pub file: PathBuf,
    /// Canvas coordinate of the image's top-left pixel.
    pub origin: (i32, i32),
    /// Optional sub-sampling of the source image.
    pub stride: Option<Stride>,
    /// Palette index treated as transparent after quantization.
    pub transparent_color: Option<u8>,
    /// Shuffle the pixel list before diffing, for visual variety.
    pub shuffle: bool,
    /// Fixed shuffle seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl OverlayConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            origin: (0, 0),
            stride: None,
            transparent_color: None,
            shuffle: true,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(stride) = self.stride {
            if stride.step == 0 {
                return Err("Stride step must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}

/// Knobs for a reinforcement (`protect`) pass.
#[derive(Debug, Clone, Copy)]
pub struct ProtectParams {
    pub max_credit: u64,
    pub min_level: u32,
    pub batch_size: usize,
}

impl Default for ProtectParams {
    fn default() -> Self {
        Self {
            max_credit: 100,
            min_level: 2,
            batch_size: 3,
        }
    }
}

/// Knobs for a correction (`fix`) pass.
#[derive(Debug, Clone, Copy)]
pub struct FixParams {
    pub max_credit: u64,
    pub max_level: u32,
    /// Also raise the level of every repainted pixel. Off by default:
    /// upgrading doubles the per-pixel cost and halves reach.
    pub upgrade: bool,
    pub batch_size: usize,
}

impl Default for FixParams {
    fn default() -> Self {
        Self {
            max_credit: 100,
            max_level: 4,
            upgrade: false,
            batch_size: 3,
        }
    }
}

/// Which pass to run, with its knobs.
#[derive(Debug, Clone, Copy)]
pub enum RunMode {
    Protect(ProtectParams),
    Fix(FixParams),
}

impl RunMode {
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Protect(p) => p.batch_size,
            Self::Fix(p) => p.batch_size,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size() == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Everything one session run needs besides the service connection.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub overlay: OverlayConfig,
    pub mode: RunMode,
    /// Where to cache the palette between runs.
    pub palette_cache: PathBuf,
    /// Optionally persist the fetched board snapshot PNG.
    pub save_map: Option<PathBuf>,
}

impl SessionConfig {
    pub fn new(overlay: OverlayConfig, mode: RunMode) -> Self {
        Self {
            overlay,
            mode,
            palette_cache: PathBuf::from("colors.json"),
            save_map: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.overlay.validate()?;
        self.mode.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let protect = ProtectParams::default();
        assert_eq!(protect.max_credit, 100);
        assert_eq!(protect.min_level, 2);
        assert_eq!(protect.batch_size, 3);

        let fix = FixParams::default();
        assert_eq!(fix.max_credit, 100);
        assert_eq!(fix.max_level, 4);
        assert!(!fix.upgrade);
        assert_eq!(fix.batch_size, 3);
    }

    #[test]
    fn test_session_config_validation() {
        let mut config = SessionConfig::new(
            OverlayConfig::new("overlay.png"),
            RunMode::Fix(FixParams::default()),
        );
        assert!(config.validate().is_ok());

        config.mode = RunMode::Fix(FixParams {
            batch_size: 0,
            ..FixParams::default()
        });
        assert!(config.validate().is_err());

        config.mode = RunMode::Protect(ProtectParams::default());
        config.overlay.stride = Some(Stride { init: 0, step: 0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_requires_endpoint() {
        let config = ConnectionConfig {
            endpoint: String::new(),
            auth_token: None,
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            endpoint: "https://canvas.example/graphql".to_string(),
            auth_token: Some("token".to_string()),
        };
        assert!(config.validate().is_ok());
    }
}
