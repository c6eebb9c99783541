use std::collections::BTreeSet;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::stopper::StoppingRuleKind;

/// A set of color indices.
pub type ColorSet = BTreeSet<usize>;

/// How the per-color adjacency of the traversal colors is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Combination {
    /// An edge in any traversal color can be followed.
    Or,
    /// An edge must be present in every traversal color.
    And,
}

impl Default for Combination {
    fn default() -> Self {
        Combination::Or
    }
}

/// Direction of a single step: towards the end of the sequence
/// (appending) or towards its start (prepending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn is_forward(&self) -> bool {
        matches!(self, Direction::Forward)
    }

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Which way(s) a depth-first search explores from its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum TraversalDirection {
    Forward,
    Reverse,
    Both,
}

impl Default for TraversalDirection {
    fn default() -> Self {
        TraversalDirection::Forward
    }
}

impl TraversalDirection {
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            TraversalDirection::Forward => &[Direction::Forward],
            TraversalDirection::Reverse => &[Direction::Reverse],
            TraversalDirection::Both => {
                &[Direction::Reverse, Direction::Forward]
            }
        }
    }
}

/// Everything about a traversal that can be written down as plain
/// data. The graph, links, sinks, regions of interest and previous
/// graph are attached when the engine is built.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct TraversalConfig {
    /// Colors whose edges are followed.
    pub traversal_colors: ColorSet,
    /// Colors whose reappearance marks a reunion.
    pub joining_colors: ColorSet,
    /// Colors recruited for extra evidence; passed through to the
    /// stopping rules.
    pub recruitment_colors: ColorSet,
    pub combination: Combination,
    pub direction: TraversalDirection,
    pub stopping_rule: Option<StoppingRuleKind>,
}

impl TraversalConfig {
    pub fn new<I>(traversal_colors: I, stopping_rule: StoppingRuleKind) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        TraversalConfig {
            traversal_colors: traversal_colors.into_iter().collect(),
            stopping_rule: Some(stopping_rule),
            ..Default::default()
        }
    }

    /// Every color the configuration refers to.
    pub fn all_colors(&self) -> impl Iterator<Item = usize> + '_ {
        self.traversal_colors
            .iter()
            .chain(self.joining_colors.iter())
            .chain(self.recruitment_colors.iter())
            .copied()
    }

    #[cfg(feature = "serde1")]
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde1")]
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
