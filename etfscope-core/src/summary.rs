//! Category → group hierarchy of a universe, sized by group market cap.
//!
//! This is the data behind a treemap view: each category node holds its
//! groups, each group weighted by `groupMarketSum`.

use crate::domain::EtfCategory;
use crate::filter::EtfUniverse;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    pub group: String,
    pub itemcode: String,
    pub group_market_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub category: EtfCategory,
    pub total: f64,
    /// Largest group first.
    pub groups: Vec<GroupNode>,
}

/// Build the category summary. Categories are ordered by total, largest first.
pub fn summarize_by_category(universe: &EtfUniverse) -> Vec<CategoryNode> {
    let mut by_category: BTreeMap<EtfCategory, Vec<GroupNode>> = BTreeMap::new();
    for rep in universe {
        by_category
            .entry(rep.row.category())
            .or_default()
            .push(GroupNode {
                group: rep.group.clone(),
                itemcode: rep.itemcode().to_string(),
                group_market_sum: rep.group_market_sum,
            });
    }

    let mut nodes: Vec<CategoryNode> = by_category
        .into_iter()
        .map(|(category, mut groups)| {
            groups.sort_by(|a, b| b.group_market_sum.total_cmp(&a.group_market_sum));
            CategoryNode {
                category,
                total: groups.iter().map(|g| g.group_market_sum).sum(),
                groups,
            }
        })
        .collect();
    nodes.sort_by(|a, b| b.total.total_cmp(&a.total));
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingRow;
    use crate::filter::{filter_listing, FilterConfig};
    use serde_json::json;

    #[test]
    fn groups_land_under_their_category() {
        let rows = vec![
            ListingRow::new("A", "KODEX 200", 5000.0).with_column("etfTabCode", json!(1)),
            ListingRow::new("B", "TIGER 200", 3000.0).with_column("etfTabCode", json!(1)),
            ListingRow::new("C", "KODEX 미국S&P500", 9000.0).with_column("etfTabCode", json!(4)),
            ListingRow::new("D", "KODEX 골드선물(H)", 1000.0).with_column("etfTabCode", json!(5)),
            ListingRow::new("E", "TIGER 코스닥150", 1500.0).with_column("etfTabCode", json!(1)),
        ];
        let universe = filter_listing(&rows, &FilterConfig::new(Vec::<String>::new(), 0.0)).unwrap();
        let nodes = summarize_by_category(&universe);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].category, EtfCategory::DomesticIndex);
        assert_eq!(nodes[0].total, 9500.0);
        assert_eq!(nodes[0].groups[0].group, "200");
        assert_eq!(nodes[0].groups[1].group, "코스닥150");
        assert_eq!(nodes[1].category, EtfCategory::OverseasEquity);
        assert_eq!(nodes[2].groups[0].group, "골드");
    }

    #[test]
    fn empty_universe_has_no_nodes() {
        assert!(summarize_by_category(&EtfUniverse::default()).is_empty());
    }
}
