mod analyzer;
mod errors;
mod fetcher;
mod layout;
mod models;
mod palette;
mod renderer;

use analyzer::FunnelAnalyzer;
use anyhow::Result;
use chrono::Local;
use clap::{Arg, Command};
use fetcher::SheetFetcher;
use models::{Config, DataSourceMode, FunnelGraph, NodeCategory, ROOT_LABEL};
use palette::ColorResolver;
use renderer::{RenderBundle, SankeyRenderer};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("funnel-analyzer")
        .version("1.0")
        .about("Builds a Sankey diagram of job application funnel progression")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        println!(
            "⚠️  Please edit {} and set your sheet ID or data file, then run the program again.",
            config_file
        );
        return Ok(());
    };

    let fetcher = SheetFetcher::new();
    let raw_table = match config.data_source_mode {
        DataSourceMode::Internet => {
            if config.sheet_id.is_empty() {
                println!("❌ Error: sheet_id is empty in configuration file");
                println!("   Please edit {} and set the sheet ID", config_file);
                return Ok(());
            }
            fetcher
                .fetch_sheet(&config.sheet_id, &config.sheet_name)
                .await?
        }
        DataSourceMode::Local => match config.data_file.as_deref() {
            Some(data_file) => {
                println!("📂 Reading applications from: {}", data_file);
                fetcher.read_file(data_file)?
            }
            None => {
                println!("❌ Error: data_file is not set in configuration file");
                println!("   Please edit {} and set the data file path", config_file);
                return Ok(());
            }
        },
    };
    println!("   ✅ Fetched {} rows", raw_table.row_count());

    let applications = fetcher::clean_table(&raw_table, &config.drop_columns)?;
    println!(
        "🧹 Cleaned table: {} rows, {} columns",
        applications.row_count(),
        applications.headers.len()
    );

    let funnel_analyzer = FunnelAnalyzer::new(&config);
    let graph = funnel_analyzer.analyze(&applications)?;
    println!(
        "🔀 Funnel graph: {} nodes, {} transitions",
        graph.nodes.len(),
        graph.edges.len()
    );

    let resolver = ColorResolver::new(&config.palette, config.link_opacity);
    let node_colors = resolver.node_colors(&graph)?;
    let link_colors = resolver.link_colors(&graph)?;
    let positions = layout::assign_positions(&graph);

    let today = Local::now().date_naive();
    let bundle = RenderBundle::assemble(
        &graph,
        node_colors,
        link_colors,
        &positions,
        &config.diagram_title,
        config.diagram_subtitle.as_deref(),
        today,
    )?;

    let output_dir = config.output_directory.as_deref().unwrap_or("data/output");
    let sankey_renderer = SankeyRenderer::new(output_dir, today);
    let (json_path, html_path) = sankey_renderer.write_artifacts(&bundle)?;

    print_summary(&graph);

    println!("\n✅ Diagram generated!");
    println!("📄 Figure JSON: {}", json_path.display());
    println!("🌐 Diagram page: {}", html_path.display());
    Ok(())
}

fn print_summary(graph: &FunnelGraph) {
    println!("\n📊 SUMMARY");
    println!("==========\n");

    let total = graph.node(ROOT_LABEL).map(|n| n.count).unwrap_or(0);
    println!("📈 Total applications: {}", total);

    println!("\n🗂️  Applications by source:");
    for node in graph
        .nodes
        .iter()
        .filter(|n| n.category == NodeCategory::Source)
    {
        println!("   - {}: {}", node.label, node.count);
    }

    let category_total = |category: NodeCategory| -> u64 {
        graph
            .nodes
            .iter()
            .filter(|n| n.category == category)
            .map(|n| n.count)
            .sum()
    };

    println!("\n🎯 Outcomes:");
    println!(
        "   💼 Offers extended: {}",
        category_total(NodeCategory::OfferedTerminal)
    );
    println!(
        "   ✅ Offers accepted: {}",
        category_total(NodeCategory::AcceptedTerminal)
    );
    println!(
        "   🙅 Offers declined: {}",
        category_total(NodeCategory::DeclinedTerminal)
    );
    println!(
        "   ❌ Rejections: {}",
        category_total(NodeCategory::RejectedTerminal)
    );
    println!(
        "   🚪 Withdrawn: {}",
        category_total(NodeCategory::WithdrawnTerminal)
    );
    println!(
        "   🔇 No reply: {}",
        category_total(NodeCategory::NoReply)
    );
}
