use serde::{Deserialize, Serialize};

/// Packing configuration.
/// Key notes:
///   - `margin` pads every item on its right and bottom edge, so two neighbours are always `margin` apart
///   - `max_canvas_size` bounds the doubling search; packing fails loudly past it
///   - `check_integrity` re-validates the grid after every placement (slow, for debugging)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackerConfig {
    /// Pixels of padding added to each item's footprint.
    #[serde(default)]
    pub margin: u32,
    /// Largest canvas side (power of two) the packer may grow to.
    #[serde(default = "default_max_canvas_size")]
    pub max_canvas_size: u32,
    /// Run the grid integrity check after every placement, not only after each successful attempt.
    #[serde(default)]
    pub check_integrity: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            margin: 0,
            max_canvas_size: default_max_canvas_size(),
            check_integrity: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_canvas_size` is zero or not a power of two
    /// - `margin` alone would not fit into the largest canvas
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::TileAtlasError;

        if !self.max_canvas_size.is_power_of_two() {
            return Err(TileAtlasError::InvalidConfig(format!(
                "max_canvas_size ({}) must be a non-zero power of two",
                self.max_canvas_size
            )));
        }

        if self.margin >= self.max_canvas_size {
            return Err(TileAtlasError::InvalidConfig(format!(
                "margin ({}) leaves no usable space in a {}x{} canvas",
                self.margin, self.max_canvas_size, self.max_canvas_size
            )));
        }

        Ok(())
    }
}

fn default_max_canvas_size() -> u32 {
    4096
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn max_canvas_size(mut self, v: u32) -> Self {
        self.cfg.max_canvas_size = v;
        self
    }
    pub fn check_integrity(mut self, v: bool) -> Self {
        self.cfg.check_integrity = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}
