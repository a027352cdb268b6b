//! Operational alerts

use serde::Serialize;

text_enum! {
    pub enum AlertType {
        StockLow => "stock_low",
        StockCritical => "stock_critical",
        ProductUnmapped => "product_unmapped",
        IncompleteRecipe => "incomplete_recipe",
        SaleError => "sale_error",
    }
}

text_enum! {
    pub enum AlertPriority {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

text_enum! {
    pub enum AlertStatus {
        Pending => "pending",
        Resolved => "resolved",
        Dismissed => "dismissed",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub stock_low: usize,
    pub stock_critical: usize,
    pub product_unmapped: usize,
    pub incomplete_recipe: usize,
    pub sale_error: usize,
}

/// Breakdown of pending alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_priority: PriorityCounts,
    pub by_type: TypeCounts,
}

impl AlertStats {
    /// Tally alerts; values that fail to parse count toward the total only
    pub fn tally<I>(alerts: I) -> Self
    where
        I: IntoIterator<Item = (Option<AlertPriority>, Option<AlertType>)>,
    {
        alerts
            .into_iter()
            .fold(Self::default(), |mut stats, (priority, kind)| {
                stats.total += 1;
                match priority {
                    Some(AlertPriority::High) => stats.by_priority.high += 1,
                    Some(AlertPriority::Medium) => stats.by_priority.medium += 1,
                    Some(AlertPriority::Low) => stats.by_priority.low += 1,
                    None => {}
                }
                match kind {
                    Some(AlertType::StockLow) => stats.by_type.stock_low += 1,
                    Some(AlertType::StockCritical) => stats.by_type.stock_critical += 1,
                    Some(AlertType::ProductUnmapped) => stats.by_type.product_unmapped += 1,
                    Some(AlertType::IncompleteRecipe) => stats.by_type.incomplete_recipe += 1,
                    Some(AlertType::SaleError) => stats.by_type.sale_error += 1,
                    None => {}
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let stats = AlertStats::tally(vec![
            (Some(AlertPriority::High), Some(AlertType::StockCritical)),
            (Some(AlertPriority::High), Some(AlertType::StockLow)),
            (Some(AlertPriority::Low), Some(AlertType::ProductUnmapped)),
            (None, None),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_priority.high, 2);
        assert_eq!(stats.by_priority.low, 1);
        assert_eq!(stats.by_type.stock_critical, 1);
        assert_eq!(stats.by_type.product_unmapped, 1);
    }
}
