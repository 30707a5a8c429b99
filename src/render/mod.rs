mod order;

pub use order::{Cells, RenderOrder, Traversal};

use serde::Deserialize;

/// Knobs that change what the compositor draws without changing the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// When set, cells holding index `0` issue no draw call. The traversal
    /// still advances over them, so positions of later cells are unchanged.
    pub skip_empty_tiles: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_drawing_every_index() {
        assert!(!RenderConfig::default().skip_empty_tiles);
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let cfg: RenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RenderConfig::default());

        let cfg: RenderConfig = serde_json::from_str(r#"{"skip_empty_tiles":true}"#).unwrap();
        assert!(cfg.skip_empty_tiles);
    }
}
