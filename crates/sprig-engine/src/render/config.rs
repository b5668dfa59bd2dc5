use super::RendererError;

/// Largest quad capacity whose vertex indices still fit in `u16`.
pub const MAX_QUADS_LIMIT: usize = (u16::MAX as usize + 1) / 4;

/// Batch renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Quads per batch. The vertex capacity is four times this.
    pub max_quads: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { max_quads: 10_000 }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), RendererError> {
        if self.max_quads == 0 || self.max_quads > MAX_QUADS_LIMIT {
            return Err(RendererError::Config(format!(
                "max_quads must be in 1..={MAX_QUADS_LIMIT}, got {}",
                self.max_quads
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_quads * 4
    }

    #[inline]
    pub fn max_indices(&self) -> usize {
        self.max_quads * 6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_ten_thousand_quads() {
        let cfg = RendererConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_vertices(), 40_000);
        assert_eq!(cfg.max_indices(), 60_000);
    }

    #[test]
    fn capacity_is_bounded_by_u16_indices() {
        assert!(RendererConfig { max_quads: 16_384 }.validate().is_ok());
        assert!(RendererConfig { max_quads: 16_385 }.validate().is_err());
        assert!(RendererConfig { max_quads: 0 }.validate().is_err());
    }
}
