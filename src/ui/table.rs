use tabled::{settings::Style, Table, Tabled};
use crate::graph::GraphStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Totals first, then one row per node kind present
pub fn stats_table(stats: &GraphStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("nodes", &stats.total_nodes.to_string());
    builder.add_row("edges", &stats.total_edges.to_string());
    builder.add_row("worlds", &stats.worlds.to_string());
    for (kind, count) in &stats.by_kind {
        builder.add_row(kind.as_str(), &count.to_string());
    }
    builder.build()
}
