use crate::models::FunnelGraph;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// One weighted link, endpoints given as 0-based indices into the node list
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLink {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    pub color: String,
}

/// Exactly the data the rendering engine consumes: display labels, colors,
/// positions and indexed links, all in node/edge order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBundle {
    pub labels: Vec<String>,
    pub node_colors: Vec<String>,
    pub node_x: Vec<f64>,
    pub node_y: Vec<f64>,
    pub links: Vec<RenderLink>,
    pub title: String,
    pub subtitle: Option<String>,
    pub caption: String,
}

impl RenderBundle {
    pub fn assemble(
        graph: &FunnelGraph,
        node_colors: Vec<String>,
        link_colors: Vec<String>,
        positions: &[(f64, f64)],
        title: &str,
        subtitle: Option<&str>,
        date: NaiveDate,
    ) -> Result<Self> {
        let labels = graph
            .nodes
            .iter()
            .map(|node| format!("{}: {}", node.label, node.count))
            .collect();

        let mut links = Vec::with_capacity(graph.edges.len());
        for (edge, color) in graph.edges.iter().zip(link_colors) {
            let source = graph
                .node_index(&edge.source)
                .with_context(|| format!("edge source {:?} is not in the node list", edge.source))?;
            let target = graph
                .node_index(&edge.target)
                .with_context(|| format!("edge target {:?} is not in the node list", edge.target))?;
            links.push(RenderLink {
                source,
                target,
                value: edge.weight,
                color,
            });
        }

        Ok(Self {
            labels,
            node_colors,
            node_x: positions.iter().map(|(x, _)| *x).collect(),
            node_y: positions.iter().map(|(_, y)| *y).collect(),
            links,
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            caption: format!("as of {}", date.format("%d %b %Y")),
        })
    }
}

/// Writes the finished figure as a plotly-shaped JSON file and a
/// self-contained HTML page
pub struct SankeyRenderer {
    output_dir: PathBuf,
    date: NaiveDate,
}

impl SankeyRenderer {
    pub fn new(output_dir: &str, date: NaiveDate) -> Self {
        Self {
            output_dir: PathBuf::from(output_dir),
            date,
        }
    }

    /// Build the plotly figure object for the bundle
    pub fn figure_json(bundle: &RenderBundle) -> serde_json::Value {
        let mut annotations = Vec::new();
        if let Some(subtitle) = &bundle.subtitle {
            annotations.push(json!({
                "x": 0.5, "y": 1.07, "showarrow": false,
                "text": subtitle, "xref": "paper", "yref": "paper"
            }));
        }
        annotations.push(json!({
            "x": 0.5, "y": 1.04, "showarrow": false,
            "text": bundle.caption, "xref": "paper", "yref": "paper"
        }));

        json!({
            "data": [{
                "type": "sankey",
                "valueformat": ".0f",
                "arrangement": "snap",
                "node": {
                    "pad": 20,
                    "thickness": 10,
                    "label": bundle.labels,
                    "color": bundle.node_colors,
                    "x": bundle.node_x,
                    "y": bundle.node_y
                },
                "link": {
                    "source": bundle.links.iter().map(|l| l.source).collect::<Vec<_>>(),
                    "target": bundle.links.iter().map(|l| l.target).collect::<Vec<_>>(),
                    "value": bundle.links.iter().map(|l| l.value).collect::<Vec<_>>(),
                    "color": bundle.links.iter().map(|l| l.color.clone()).collect::<Vec<_>>()
                }
            }],
            "layout": {
                "title": {
                    "text": format!("<b>{}</b>", bundle.title),
                    "xanchor": "center",
                    "x": 0.5,
                    "font": {"size": 22, "family": "Helvetica"}
                },
                "font": {"size": 14, "family": "Helvetica"},
                "width": 1200,
                "height": 800,
                "annotations": annotations
            }
        })
    }

    /// Write the JSON and HTML artifacts, returning their paths
    pub fn write_artifacts(&self, bundle: &RenderBundle) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", self.output_dir)
        })?;

        let figure = Self::figure_json(bundle);
        let stamp = self.date.format("%d%m%y");

        let json_path = self
            .output_dir
            .join(format!("application_funnel_{}.json", stamp));
        let json_content =
            serde_json::to_string_pretty(&figure).context("Failed to serialize figure")?;
        fs::write(&json_path, json_content)
            .with_context(|| format!("Failed to write figure JSON: {:?}", json_path))?;

        let html_path = self
            .output_dir
            .join(format!("application_funnel_{}.html", stamp));
        fs::write(&html_path, Self::html_page(bundle, &figure)?)
            .with_context(|| format!("Failed to write diagram page: {:?}", html_path))?;

        Ok((json_path, html_path))
    }

    fn html_page(bundle: &RenderBundle, figure: &serde_json::Value) -> Result<String> {
        let figure_json = serde_json::to_string(figure).context("Failed to serialize figure")?;
        Ok(format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>{}</title>\n\
             <script src=\"https://cdn.plot.ly/plotly-2.32.0.min.js\"></script>\n\
             </head>\n\
             <body>\n\
             <div id=\"funnel\"></div>\n\
             <script>\n\
             const figure = {};\n\
             Plotly.newPlot(\"funnel\", figure.data, figure.layout);\n\
             </script>\n\
             </body>\n\
             </html>\n",
            bundle.title, figure_json
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunnelEdge, FunnelNode, NodeCategory};

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
                    label: "Offered".to_string(),
                    category: NodeCategory::OfferedTerminal,
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
                    target: "Offered".to_string(),
                    weight: 1,
                },
            ],
        }
    }

    fn sample_bundle() -> RenderBundle {
        let graph = sample_graph();
        let node_colors = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let link_colors = vec!["d".to_string(), "e".to_string()];
        let positions = vec![(0.1, 0.5), (0.3, 0.1), (0.8, 0.7)];
        let date = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        RenderBundle::assemble(
            &graph,
            node_colors,
            link_colors,
            &positions,
            "Job Applications Sankey Diagram",
            Some("Five months of internship applications"),
            date,
        )
        .unwrap()
    }

    #[test]
    fn labels_are_decorated_with_counts() {
        let bundle = sample_bundle();
        assert_eq!(
            bundle.labels,
            vec!["Applications: 2", "LinkedIn: 2", "Offered: 1"]
        );
    }

    #[test]
    fn links_use_zero_based_node_indices() {
        let bundle = sample_bundle();
        assert_eq!(
            bundle.links,
            vec![
                RenderLink {
                    source: 0,
                    target: 1,
                    value: 2,
                    color: "d".to_string(),
                },
                RenderLink {
                    source: 1,
                    target: 2,
                    value: 1,
                    color: "e".to_string(),
                },
            ]
        );
    }

    #[test]
    fn caption_carries_the_run_date() {
        let bundle = sample_bundle();
        assert_eq!(bundle.caption, "as of 31 Jul 2024");
    }

    #[test]
    fn figure_has_the_sankey_trace_shape() {
        let bundle = sample_bundle();
        let figure = SankeyRenderer::figure_json(&bundle);

        assert_eq!(figure["data"][0]["type"], "sankey");
        assert_eq!(figure["data"][0]["valueformat"], ".0f");
        assert_eq!(figure["data"][0]["arrangement"], "snap");
        assert_eq!(figure["data"][0]["node"]["pad"], 20);
        assert_eq!(figure["data"][0]["node"]["thickness"], 10);
        assert_eq!(figure["data"][0]["link"]["source"][1], 1);
        assert_eq!(figure["data"][0]["link"]["value"][0], 2);
        assert_eq!(figure["layout"]["width"], 1200);
        assert_eq!(
            figure["layout"]["title"]["text"],
            "<b>Job Applications Sankey Diagram</b>"
        );
        // Subtitle annotation first, then the dated caption
        assert_eq!(figure["layout"]["annotations"][1]["text"], "as of 31 Jul 2024");
    }

    #[test]
    fn artifacts_are_written_with_the_date_stamp() {
        let bundle = sample_bundle();
        let output_dir = std::env::temp_dir().join(format!("funnel_out_{}", std::process::id()));
        let renderer = SankeyRenderer::new(
            output_dir.to_str().unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        );

        let (json_path, html_path) = renderer.write_artifacts(&bundle).unwrap();
        assert!(json_path.ends_with("application_funnel_310724.json"));
        assert!(html_path.ends_with("application_funnel_310724.html"));

        let html = fs::read_to_string(&html_path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["data"][0]["type"], "sankey");

        fs::remove_dir_all(&output_dir).ok();
    }
}
