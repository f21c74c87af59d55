//! CSV and JSON export of a filtered universe.
//!
//! CSV columns: itemcode, itemname, category, group, marketSum, groupMarketSum

use std::path::Path;

use anyhow::{Context, Result};
use etfscope_core::filter::EtfUniverse;
use etfscope_core::summary::CategoryNode;

/// Render the universe as CSV, in universe order.
pub fn export_universe_csv(universe: &EtfUniverse) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "itemcode",
        "itemname",
        "category",
        "group",
        "marketSum",
        "groupMarketSum",
    ])?;

    for rep in universe {
        let market_sum = rep.market_sum.to_string();
        let group_market_sum = rep.group_market_sum.to_string();
        wtr.write_record([
            rep.itemcode(),
            rep.itemname(),
            rep.row.category().label(),
            rep.group.as_str(),
            market_sum.as_str(),
            group_market_sum.as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the universe CSV to a file.
pub fn write_universe_csv(path: &Path, universe: &EtfUniverse) -> Result<()> {
    let csv = export_universe_csv(universe)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write universe CSV {}", path.display()))
}

/// Pretty JSON of the category summary.
pub fn export_category_json(nodes: &[CategoryNode]) -> Result<String> {
    serde_json::to_string_pretty(nodes).context("failed to serialize category summary")
}
