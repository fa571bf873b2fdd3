//! Configuration file format for the demo binary (`[bin]` / `[[items]]`).

use serde::{Deserialize, Serialize};

/// One candidate item to pack into the bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// The item's name, used as the Request's name.
    pub name: String,
    /// How much bin capacity the item consumes if accepted.
    pub size: u32,
}

/// The bin being packed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    /// The bin's total capacity.
    pub capacity: u32,
}

/// The demo binary's full configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The bin configuration.
    pub bin: BinConfig,
    /// The catalog of items to consider packing, in natural order.
    pub items: Vec<ItemConfig>,
    /// Upper bound passed to every `generate_children` call.
    #[serde(default = "default_max_n")]
    pub max_n: usize,
    /// Whether to explore every ordering of `items` via a
    /// `StandardPermutationGenerator`, rather than packing in the order
    /// they appear in the config.
    #[serde(default)]
    pub permute: bool,
}

fn default_max_n() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bin: BinConfig { capacity: 10 },
            items: vec![
                ItemConfig {
                    name: "widget".to_string(),
                    size: 4,
                },
                ItemConfig {
                    name: "gadget".to_string(),
                    size: 3,
                },
                ItemConfig {
                    name: "gizmo".to_string(),
                    size: 5,
                },
            ],
            max_n: default_max_n(),
            permute: true,
        }
    }
}
