use crate::errors::FunnelError;
use crate::models::{
    ApplicationRecord, ApplicationTable, Config, FunnelEdge, FunnelGraph, FunnelNode,
    NodeCategory, NO_REPLY_LABEL, ROOT_LABEL,
};
use regex::Regex;
use std::collections::HashMap;

/// Name of the column holding the job posting source
const SOURCE_COLUMN: &str = "Source";
/// Naming convention for the ordered status stage columns
const STAGE_COLUMN_PATTERN: &str = r"^Status\s*(\d+)$";

/// Column positions resolved from the cleaned table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub source_column: usize,
    /// Stage column indices, stage 1 first
    pub stage_columns: Vec<usize>,
}

/// Category assignment for every distinct value observed in the table,
/// plus the first-seen orderings used for deterministic node enumeration
#[derive(Debug, Clone)]
pub struct NodeClassification {
    pub categories: HashMap<String, NodeCategory>,
    pub source_labels: Vec<String>,
    pub status_labels: Vec<String>,
}

/// Edge weights and node counts accumulated over the three flow passes
#[derive(Debug, Clone)]
pub struct FlowAccumulation {
    edge_order: Vec<(String, String)>,
    edge_weights: HashMap<(String, String), u64>,
    node_counts: HashMap<String, u64>,
    root_count: u64,
    no_reply_count: u64,
}

pub struct FunnelAnalyzer<'a> {
    config: &'a Config,
}

impl<'a> FunnelAnalyzer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Main analysis function: cleaned table in, finished funnel graph out
    pub fn analyze(&self, table: &ApplicationTable) -> Result<FunnelGraph, FunnelError> {
        let schema = self.resolve_schema(table)?;
        let records = self.extract_records(table, &schema);

        if records.is_empty() {
            return Err(FunnelError::DataUnavailable {
                origin: "cleaned application table".to_string(),
            });
        }

        let classification = self.classify_nodes(&records)?;
        let flows = self.aggregate_flows(&records);
        Ok(self.build_graph(&classification, &flows))
    }

    /// Locate the source column and the ordered status stage columns.
    /// Stage columns follow the `Status N` naming convention and are ordered
    /// by their stage number, so a reordered sheet cannot swap stages.
    pub fn resolve_schema(&self, table: &ApplicationTable) -> Result<TableSchema, FunnelError> {
        let stage_regex = Regex::new(STAGE_COLUMN_PATTERN).unwrap();

        let mut stages: Vec<(u32, usize)> = Vec::new();
        for (index, header) in table.headers.iter().enumerate() {
            if let Some(captures) = stage_regex.captures(header.trim()) {
                if let Some(number) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok())
                {
                    stages.push((number, index));
                }
            }
        }

        if stages.is_empty() {
            return Err(FunnelError::Schema {
                reason: format!(
                    "no status stage columns found among [{}]",
                    table.headers.join(", ")
                ),
            });
        }
        stages.sort_by_key(|(number, _)| *number);

        let source_column =
            table
                .column_index(SOURCE_COLUMN)
                .ok_or_else(|| FunnelError::Schema {
                    reason: format!("no '{}' column found", SOURCE_COLUMN),
                })?;

        Ok(TableSchema {
            source_column,
            stage_columns: stages.into_iter().map(|(_, index)| index).collect(),
        })
    }

    /// Project table rows into application records. Rows without a source
    /// value carry no usable funnel entry point and are skipped.
    pub fn extract_records(
        &self,
        table: &ApplicationTable,
        schema: &TableSchema,
    ) -> Vec<ApplicationRecord> {
        table
            .rows
            .iter()
            .filter_map(|row| {
                let source = row.get(schema.source_column).cloned().flatten()?;
                let stages = schema
                    .stage_columns
                    .iter()
                    .map(|&column| row.get(column).cloned().flatten())
                    .collect();
                Some(ApplicationRecord { source, stages })
            })
            .collect()
    }

    /// Assign every distinct observed value to exactly one category.
    /// Rules are evaluated in priority order, first match wins.
    pub fn classify_nodes(
        &self,
        records: &[ApplicationRecord],
    ) -> Result<NodeClassification, FunnelError> {
        let mut source_labels: Vec<String> = Vec::new();
        for record in records {
            if !source_labels.contains(&record.source) {
                source_labels.push(record.source.clone());
            }
        }

        // Distinct statuses in stage-major order: all of stage 1 top to
        // bottom, then stage 2, and so on. Keeps node enumeration stable.
        let stage_count = records.iter().map(|r| r.stages.len()).max().unwrap_or(0);
        let mut status_labels: Vec<String> = Vec::new();
        for stage in 0..stage_count {
            for record in records {
                if let Some(Some(status)) = record.stages.get(stage) {
                    if !status_labels.contains(status) {
                        status_labels.push(status.clone());
                    }
                }
            }
        }

        for value in source_labels.iter().chain(status_labels.iter()) {
            if value == ROOT_LABEL || value == NO_REPLY_LABEL {
                return Err(FunnelError::UnclassifiedNode {
                    value: value.clone(),
                });
            }
        }

        let mut categories = HashMap::new();
        categories.insert(ROOT_LABEL.to_string(), NodeCategory::Root);
        categories.insert(NO_REPLY_LABEL.to_string(), NodeCategory::NoReply);
        for value in source_labels.iter().chain(status_labels.iter()) {
            let category = self.classify_value(value, &source_labels);
            categories.insert(value.clone(), category);
        }

        Ok(NodeClassification {
            categories,
            source_labels,
            status_labels,
        })
    }

    fn classify_value(&self, value: &str, source_labels: &[String]) -> NodeCategory {
        let config = self.config;
        if config.rejection_labels.iter().any(|label| label == value) {
            NodeCategory::RejectedTerminal
        } else if value == config.withdrawal_label {
            NodeCategory::WithdrawnTerminal
        } else if value == config.offer_label {
            NodeCategory::OfferedTerminal
        } else if value == config.acceptance_label {
            NodeCategory::AcceptedTerminal
        } else if value == config.decline_label {
            NodeCategory::DeclinedTerminal
        } else if source_labels.iter().any(|label| label == value) {
            NodeCategory::Source
        } else {
            NodeCategory::IntermediateStatus
        }
    }

    /// Accumulate edge weights and node counts over three passes:
    /// root -> source, source -> stage 1 (with the "No reply" fallback),
    /// and stage k -> stage k+1 for every consecutive stage pair.
    ///
    /// Only a missing stage 1 produces a "No reply" edge. A gap at a later
    /// stage ends the funnel at the last recorded status, with no synthetic
    /// edge. Conservation totals depend on this asymmetry.
    pub fn aggregate_flows(&self, records: &[ApplicationRecord]) -> FlowAccumulation {
        let mut flows = FlowAccumulation {
            edge_order: Vec::new(),
            edge_weights: HashMap::new(),
            node_counts: HashMap::new(),
            root_count: records.len() as u64,
            no_reply_count: 0,
        };

        // Node counts: occurrences across the source column and every stage
        // column, accumulated additively
        for record in records {
            *flows.node_counts.entry(record.source.clone()).or_insert(0) += 1;
            for status in record.stages.iter().flatten() {
                *flows.node_counts.entry(status.clone()).or_insert(0) += 1;
            }
            if record.stages.iter().all(|stage| stage.is_none()) {
                flows.no_reply_count += 1;
            }
        }

        // Pass 1: root -> source
        for record in records {
            flows.bump(ROOT_LABEL, &record.source);
        }

        // Pass 2: source -> stage 1, "No reply" when stage 1 is missing
        for record in records {
            match record.stages.first() {
                Some(Some(status)) => flows.bump(&record.source, status),
                _ => flows.bump(&record.source, NO_REPLY_LABEL),
            }
        }

        // Pass 3: stage k -> stage k+1
        let stage_count = records.iter().map(|r| r.stages.len()).max().unwrap_or(0);
        for stage in 1..stage_count {
            for record in records {
                let previous = record.stages.get(stage - 1).and_then(|s| s.as_ref());
                let current = record.stages.get(stage).and_then(|s| s.as_ref());
                if let (Some(previous), Some(current)) = (previous, current) {
                    flows.bump(previous, current);
                }
            }
        }

        flows
    }

    /// Assemble the graph in first-seen node order: root, the synthetic
    /// "No reply" terminal, sources, then statuses
    fn build_graph(
        &self,
        classification: &NodeClassification,
        flows: &FlowAccumulation,
    ) -> FunnelGraph {
        let mut nodes = Vec::new();
        nodes.push(FunnelNode {
            label: ROOT_LABEL.to_string(),
            category: NodeCategory::Root,
            count: flows.root_count,
        });
        nodes.push(FunnelNode {
            label: NO_REPLY_LABEL.to_string(),
            category: NodeCategory::NoReply,
            count: flows.no_reply_count,
        });

        for label in classification
            .source_labels
            .iter()
            .chain(classification.status_labels.iter())
        {
            let category = classification
                .categories
                .get(label)
                .copied()
                .unwrap_or(NodeCategory::IntermediateStatus);
            let count = flows.node_counts.get(label).copied().unwrap_or(0);
            nodes.push(FunnelNode {
                label: label.clone(),
                category,
                count,
            });
        }

        let edges = flows
            .edge_order
            .iter()
            .map(|key| FunnelEdge {
                source: key.0.clone(),
                target: key.1.clone(),
                weight: flows.edge_weights.get(key).copied().unwrap_or(0),
            })
            .collect();

        FunnelGraph { nodes, edges }
    }
}

impl FlowAccumulation {
    fn bump(&mut self, source: &str, target: &str) {
        let key = (source.to_string(), target.to_string());
        match self.edge_weights.get_mut(&key) {
            Some(weight) => *weight += 1,
            None => {
                self.edge_order.push(key.clone());
                self.edge_weights.insert(key, 1);
            }
        }
    }
}
