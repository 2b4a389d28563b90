use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved root node label, always first in the node list
pub const ROOT_LABEL: &str = "Applications";
/// Reserved synthetic terminal for applications with no recorded status
pub const NO_REPLY_LABEL: &str = "No reply";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub sheet_id: String,
    pub sheet_name: String,
    pub data_file: Option<String>,
    pub output_directory: Option<String>,
    pub drop_columns: Vec<String>,
    // Status label taxonomy
    pub rejection_labels: Vec<String>,
    pub withdrawal_label: String,
    pub offer_label: String,
    pub acceptance_label: String,
    pub decline_label: String,
    // Diagram appearance
    pub link_opacity: f64,
    pub diagram_title: String,
    pub diagram_subtitle: Option<String>,
    pub palette: HashMap<String, Color>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source_mode: DataSourceMode::Internet,
            sheet_id: "".to_string(),
            sheet_name: "Applications".to_string(),
            data_file: Some("data/applications.csv".to_string()),
            output_directory: Some("data/output".to_string()),
            drop_columns: vec![
                "S/N".to_string(),
                "Company".to_string(),
                "Position".to_string(),
                "Date Applied".to_string(),
                "Link".to_string(),
            ],
            rejection_labels: vec![
                "Rejected".to_string(),
                "Rejected after Applying".to_string(),
                "Rejected after Interview".to_string(),
            ],
            withdrawal_label: "DNF".to_string(),
            offer_label: "Offered".to_string(),
            acceptance_label: "Accepted".to_string(),
            decline_label: "Declined".to_string(),
            link_opacity: 0.5,
            diagram_title: "Job Applications Sankey Diagram".to_string(),
            diagram_subtitle: None,
            palette: default_palette(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// Semantic funnel position of a node, derived purely from its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Root,
    Source,
    IntermediateStatus,
    NoReply,
    RejectedTerminal,
    WithdrawnTerminal,
    OfferedTerminal,
    AcceptedTerminal,
    DeclinedTerminal,
}

impl NodeCategory {
    /// Palette key for this category in the configuration file
    pub fn key(&self) -> &'static str {
        match self {
            NodeCategory::Root => "root",
            NodeCategory::Source => "source",
            NodeCategory::IntermediateStatus => "intermediate_status",
            NodeCategory::NoReply => "no_reply",
            NodeCategory::RejectedTerminal => "rejected_terminal",
            NodeCategory::WithdrawnTerminal => "withdrawn_terminal",
            NodeCategory::OfferedTerminal => "offered_terminal",
            NodeCategory::AcceptedTerminal => "accepted_terminal",
            NodeCategory::DeclinedTerminal => "declined_terminal",
        }
    }
}

/// Base color for a node category, opacity applied at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn rgba(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

fn default_palette() -> HashMap<String, Color> {
    let blue = Color { r: 39, g: 125, b: 161 };
    let yellow = Color { r: 249, g: 199, b: 79 };
    let grey = Color { r: 173, g: 181, b: 189 };
    let red = Color { r: 249, g: 65, b: 68 };
    let green = Color { r: 67, g: 170, b: 139 };
    let black = Color { r: 0, g: 0, b: 0 };

    let mut palette = HashMap::new();
    palette.insert(NodeCategory::Root.key().to_string(), blue);
    palette.insert(NodeCategory::Source.key().to_string(), blue);
    palette.insert(NodeCategory::IntermediateStatus.key().to_string(), yellow);
    palette.insert(NodeCategory::NoReply.key().to_string(), grey);
    palette.insert(NodeCategory::RejectedTerminal.key().to_string(), red);
    palette.insert(NodeCategory::WithdrawnTerminal.key().to_string(), black);
    palette.insert(NodeCategory::OfferedTerminal.key().to_string(), green);
    palette.insert(NodeCategory::AcceptedTerminal.key().to_string(), green);
    palette.insert(NodeCategory::DeclinedTerminal.key().to_string(), green);
    palette
}

/// Tabular dataset as fetched: header row plus nullable cells
#[derive(Debug, Clone)]
pub struct ApplicationTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ApplicationTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One application: where it came from and its recorded stage statuses,
/// stage 1 first. A None means the application never reached that stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub source: String,
    pub stages: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelNode {
    pub label: String,
    pub category: NodeCategory,
    pub count: u64,
}

/// Aggregated transition: weight = number of applications taking it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Finished node and edge sets, in first-seen order. Built once per run
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelGraph {
    pub nodes: Vec<FunnelNode>,
    pub edges: Vec<FunnelEdge>,
}

impl FunnelGraph {
    pub fn node_index(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.label == label)
    }

    pub fn node(&self, label: &str) -> Option<&FunnelNode> {
        self.nodes.iter().find(|n| n.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_formats_as_rgba_with_given_opacity() {
        let blue = Color { r: 39, g: 125, b: 161 };
        assert_eq!(blue.rgba(1.0), "rgba(39, 125, 161, 1)");
        assert_eq!(blue.rgba(0.5), "rgba(39, 125, 161, 0.5)");
    }

    #[test]
    fn default_palette_covers_every_category() {
        let config = Config::default();
        let categories = [
            NodeCategory::Root,
            NodeCategory::Source,
            NodeCategory::IntermediateStatus,
            NodeCategory::NoReply,
            NodeCategory::RejectedTerminal,
            NodeCategory::WithdrawnTerminal,
            NodeCategory::OfferedTerminal,
            NodeCategory::AcceptedTerminal,
            NodeCategory::DeclinedTerminal,
        ];
        for category in categories {
            assert!(config.palette.contains_key(category.key()));
        }
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(restored.rejection_labels, config.rejection_labels);
        assert_eq!(restored.link_opacity, config.link_opacity);
        assert_eq!(restored.palette, config.palette);
    }
}
