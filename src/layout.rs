use crate::models::{FunnelGraph, NodeCategory};

/// Explicit coordinates for the well-known milestone labels. Generic
/// intermediate statuses share a horizontal band, but named milestones need
/// disambiguated vertical placement or they overlap in the rendered diagram.
const LABEL_POSITIONS: &[(&str, (f64, f64))] = &[
    ("Applications", (0.1, 0.5)),
    ("No reply", (0.6, 0.35)),
    ("Rejected after Applying", (0.5, 0.9)),
    ("Technical Assessment", (0.55, 0.725)),
    ("On-site Interview", (0.65, 0.7)),
    ("Online Interview", (0.65, 0.75)),
    ("DNF", (0.625, 0.825)),
    ("Rejected after Interview", (0.725, 0.8)),
    ("Rejected", (0.8, 0.925)),
    ("Offered", (0.8, 0.7)),
    ("Declined", (0.85, 0.75)),
    ("Accepted", (0.9, 0.65)),
];

/// Fallback coordinate for any label without an explicit entry
fn category_position(category: NodeCategory) -> (f64, f64) {
    match category {
        NodeCategory::Root => (0.1, 0.5),
        NodeCategory::Source => (0.3, 0.1),
        NodeCategory::IntermediateStatus => (0.55, 0.7),
        NodeCategory::NoReply => (0.6, 0.35),
        NodeCategory::RejectedTerminal => (0.8, 0.9),
        NodeCategory::WithdrawnTerminal => (0.625, 0.825),
        NodeCategory::OfferedTerminal => (0.8, 0.7),
        NodeCategory::AcceptedTerminal => (0.9, 0.65),
        NodeCategory::DeclinedTerminal => (0.85, 0.75),
    }
}

/// Produce an (x, y) layout hint for every node, in node order.
/// x runs left to right with funnel depth, y spreads nodes vertically,
/// both in [0, 1].
pub fn assign_positions(graph: &FunnelGraph) -> Vec<(f64, f64)> {
    graph
        .nodes
        .iter()
        .map(|node| {
            LABEL_POSITIONS
                .iter()
                .find(|(label, _)| *label == node.label)
                .map(|(_, position)| *position)
                .unwrap_or_else(|| category_position(node.category))
        })
        .collect()
}
