//! Render layers for filtering drawables per camera
//!
//! A drawable carries the layers it lives on; a camera carries the layers it
//! renders. The camera draws the drawable only when the two sets intersect.

use bitflags::bitflags;

bitflags! {
    /// Render layer bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Layers: u16 {
        /// Layer everything starts on
        const DEFAULT = 1 << 0;

        // User layers (bits 1-15)
        /// User layer 1
        const LAYER_01 = 1 << 1;
        /// User layer 2
        const LAYER_02 = 1 << 2;
        /// User layer 3
        const LAYER_03 = 1 << 3;
        /// User layer 4
        const LAYER_04 = 1 << 4;
        /// User layer 5
        const LAYER_05 = 1 << 5;
        /// User layer 6
        const LAYER_06 = 1 << 6;
        /// User layer 7
        const LAYER_07 = 1 << 7;
        /// User layer 8
        const LAYER_08 = 1 << 8;
        /// User layer 9
        const LAYER_09 = 1 << 9;
        /// User layer 10
        const LAYER_10 = 1 << 10;
        /// User layer 11
        const LAYER_11 = 1 << 11;
        /// User layer 12
        const LAYER_12 = 1 << 12;
        /// User layer 13
        const LAYER_13 = 1 << 13;
        /// User layer 14
        const LAYER_14 = 1 << 14;
        /// User layer 15
        const LAYER_15 = 1 << 15;

        /// Every layer
        const ALL = u16::MAX;
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Layers {
    /// Whether a camera rendering `self` should draw something on `layers`
    pub fn renders(self, layers: Layers) -> bool {
        self.intersects(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_layers_never_render() {
        assert!(!Layers::LAYER_01.renders(Layers::LAYER_02));
        assert!(Layers::LAYER_01.renders(Layers::LAYER_01 | Layers::LAYER_02));
        assert!(Layers::ALL.renders(Layers::LAYER_15));
        assert!(!Layers::empty().renders(Layers::ALL));
    }

    #[test]
    fn test_default_is_default_layer() {
        assert_eq!(Layers::default(), Layers::DEFAULT);
        assert_eq!(Layers::ALL.bits().count_ones(), 16);
    }
}
