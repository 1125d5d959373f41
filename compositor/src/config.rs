use serde::{Deserialize, Serialize};

use crate::vocabulary::GLYPH_SIZE;

/// Fixed proportions used by the layout operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub row_height: u32, // digits are centered in this row
    pub operator_min_height: u32,
    pub min_exponent_height: u32,
    pub exponent_margin: f64, // head room, in halves of the exponent height
    pub paren_margin: f64,
    pub fraction_overhang: u32, // bar width beyond the widest operand
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: GLYPH_SIZE,
            operator_min_height: GLYPH_SIZE,
            min_exponent_height: 20,
            exponent_margin: 1.1,
            paren_margin: 1.2,
            fraction_overhang: 20,
        }
    }
}
