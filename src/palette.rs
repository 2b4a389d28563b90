use crate::errors::FunnelError;
use crate::models::{Color, FunnelGraph, NodeCategory};
use std::collections::HashMap;

/// Maps node categories to colors. Nodes get their category's base color at
/// full opacity, links get the target node's base color at the configured
/// reduced opacity.
pub struct ColorResolver<'a> {
    palette: &'a HashMap<String, Color>,
    link_opacity: f64,
}

impl<'a> ColorResolver<'a> {
    pub fn new(palette: &'a HashMap<String, Color>, link_opacity: f64) -> Self {
        Self {
            palette,
            link_opacity,
        }
    }

    fn base_color(&self, category: NodeCategory) -> Result<Color, FunnelError> {
        self.palette
            .get(category.key())
            .copied()
            .ok_or(FunnelError::UnresolvedColor { category })
    }

    /// One color per node, in node order
    pub fn node_colors(&self, graph: &FunnelGraph) -> Result<Vec<String>, FunnelError> {
        graph
            .nodes
            .iter()
            .map(|node| Ok(self.base_color(node.category)?.rgba(1.0)))
            .collect()
    }

    /// One color per edge, in edge order, taken from the target node
    pub fn link_colors(&self, graph: &FunnelGraph) -> Result<Vec<String>, FunnelError> {
        graph
            .edges
            .iter()
            .map(|edge| {
                let category = graph
                    .node(&edge.target)
                    .map(|node| node.category)
                    .unwrap_or(NodeCategory::IntermediateStatus);
                Ok(self.base_color(category)?.rgba(self.link_opacity))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, FunnelEdge, FunnelNode};

    fn sample_graph() -> FunnelGraph {
        FunnelGraph {
            nodes: vec![
                FunnelNode {
                    label: "Applications".to_string(),
                    category: NodeCategory::Root,
                    count: 2,
                },
                FunnelNode {
                    label: "LinkedIn".to_string(),
                    category: NodeCategory::Source,
                    count: 2,
                },
                FunnelNode {
                    label: "Rejected".to_string(),
                    category: NodeCategory::RejectedTerminal,
                    count: 1,
                },
            ],
            edges: vec![
                FunnelEdge {
                    source: "Applications".to_string(),
                    target: "LinkedIn".to_string(),
                    weight: 2,
                },
                FunnelEdge {
                    source: "LinkedIn".to_string(),
                    target: "Rejected".to_string(),
                    weight: 1,
                },
            ],
        }
    }

    #[test]
    fn node_colors_use_full_opacity_base_colors() {
        let config = Config::default();
        let resolver = ColorResolver::new(&config.palette, config.link_opacity);
        let colors = resolver.node_colors(&sample_graph()).unwrap();

        assert_eq!(
            colors,
            vec![
                "rgba(39, 125, 161, 1)",
                "rgba(39, 125, 161, 1)",
                "rgba(249, 65, 68, 1)",
            ]
        );
    }

    #[test]
    fn link_colors_follow_the_target_at_reduced_opacity() {
        let config = Config::default();
        let resolver = ColorResolver::new(&config.palette, config.link_opacity);
        let colors = resolver.link_colors(&sample_graph()).unwrap();

        assert_eq!(
            colors,
            vec!["rgba(39, 125, 161, 0.5)", "rgba(249, 65, 68, 0.5)"]
        );
    }

    #[test]
    fn missing_palette_entry_is_an_error() {
        let mut palette = Config::default().palette;
        palette.remove(NodeCategory::RejectedTerminal.key());
        let resolver = ColorResolver::new(&palette, 0.5);

        match resolver.node_colors(&sample_graph()) {
            Err(FunnelError::UnresolvedColor { category }) => {
                assert_eq!(category, NodeCategory::RejectedTerminal)
            }
            other => panic!("expected unresolved color, got {:?}", other),
        }
    }
}
