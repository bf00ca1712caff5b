#![forbid(unsafe_code)]

//! Host window layering and placement constants.
//!
//! With the `policy-config` feature the configuration can be loaded from a
//! TOML policy file; keys that are absent keep their defaults.

/// Layering and placement policy for one host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct DesktopConfig {
    /// Layer for non-modal dialogs.
    pub default_layer: i32,
    /// Layer of the first modal dialog.
    pub base_modal_layer: i32,
    /// Layer distance between nested modal dialogs. The layer just below each
    /// modal dialog holds its input blocker, so this must be at least 2.
    pub modal_layer_step: i32,
    /// Distance from the top edge for top-centered dialogs.
    pub center_top_margin: i32,
    /// Upward nudge for centered dialogs in a decorated (non full-screen)
    /// window, compensating for the title bar.
    pub title_bar_allowance: i32,
    /// Gap left when a dialog overflowing the right/bottom edge is pulled
    /// back inside.
    pub edge_inset: i32,
    /// A dialog whose origin is within this distance of the right/bottom edge
    /// (or off-window) is recentered by the keep-on-screen policy.
    pub visibility_margin: i32,
}

impl DesktopConfig {
    pub const DEFAULT_LAYER: i32 = 0;
    pub const MODAL_LAYER: i32 = 200;

    /// Clamp values that would break layering invariants.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.modal_layer_step = self.modal_layer_step.max(2);
        if self.base_modal_layer <= self.default_layer {
            self.base_modal_layer = self.default_layer + self.modal_layer_step;
        }
        self.edge_inset = self.edge_inset.max(0);
        self.visibility_margin = self.visibility_margin.max(0);
        self
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            default_layer: Self::DEFAULT_LAYER,
            base_modal_layer: Self::MODAL_LAYER,
            modal_layer_step: 2,
            center_top_margin: 20,
            title_bar_allowance: 15,
            edge_inset: 2,
            visibility_margin: 50,
        }
    }
}

#[cfg(feature = "policy-config")]
mod policy {
    use super::DesktopConfig;

    /// A policy file could not be parsed.
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("invalid desktop policy: {0}")]
    pub struct ConfigError(pub String);

    impl DesktopConfig {
        /// Parse a TOML policy document.
        ///
        /// # Errors
        ///
        /// Returns [`ConfigError`] when the document is not valid TOML or a
        /// key has the wrong type.
        pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
            toml::from_str::<DesktopConfig>(input)
                .map(DesktopConfig::sanitized)
                .map_err(|err| ConfigError(err.to_string()))
        }
    }
}

#[cfg(feature = "policy-config")]
pub use policy::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layering_contract() {
        let cfg = DesktopConfig::default();
        assert_eq!(cfg.base_modal_layer, 200);
        assert_eq!(cfg.modal_layer_step, 2);
        assert!(cfg.base_modal_layer > cfg.default_layer);
    }

    #[test]
    fn sanitized_repairs_bad_layering() {
        let cfg = DesktopConfig {
            modal_layer_step: 1,
            base_modal_layer: -5,
            edge_inset: -3,
            ..DesktopConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.modal_layer_step, 2);
        assert_eq!(cfg.base_modal_layer, 2);
        assert_eq!(cfg.edge_inset, 0);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_overrides_and_defaults() {
        let cfg = DesktopConfig::from_toml_str("base_modal_layer = 400\ncenter_top_margin = 8\n")
            .unwrap();
        assert_eq!(cfg.base_modal_layer, 400);
        assert_eq!(cfg.center_top_margin, 8);
        assert_eq!(cfg.modal_layer_step, 2);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_type_error_is_reported() {
        let err = DesktopConfig::from_toml_str("edge_inset = \"wide\"").unwrap_err();
        assert!(err.to_string().starts_with("invalid desktop policy"));
    }
}
