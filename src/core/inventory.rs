//! Single-period inventory outcome and cost adjustment shared by every contract.

use serde::{Deserialize, Serialize};

use super::CostStructure;
use crate::math::EPS;

/// Realised sales/leftover/unmet split for one order quantity and one demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryOutcome {
    pub sales: f64,
    pub leftover: f64,
    pub unmet: f64,
    /// `sales / demand` in `[0, 1]`; 1 when demand is zero.
    pub service_level: f64,
}

/// Monetary effect of inventory cost rates on leftover and unmet units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub salvage: f64,
    pub holding: f64,
    pub shortage: f64,
    pub penalty: f64,
    /// `salvage - holding - shortage - penalty`.
    pub net: f64,
}

/// Splits an order quantity against a realised demand.
///
/// # Examples
/// ```
/// use contractlab::core::inventory_stats;
///
/// let s = inventory_stats(100.0, 80.0);
/// assert_eq!((s.sales, s.leftover, s.unmet), (80.0, 20.0, 0.0));
/// ```
pub fn inventory_stats(order_qty: f64, demand: f64) -> InventoryOutcome {
    let sales = order_qty.min(demand);
    let leftover = (order_qty - demand).max(0.0);
    let unmet = (demand - order_qty).max(0.0);
    let service_level = if demand <= EPS {
        1.0
    } else {
        (sales / demand).clamp(0.0, 1.0)
    };
    InventoryOutcome {
        sales,
        leftover,
        unmet,
        service_level,
    }
}

/// Applies per-unit cost rates to leftover and unmet quantities.
pub fn inventory_adjustment(
    leftover: f64,
    unmet: f64,
    costs: &CostStructure,
) -> InventoryAdjustment {
    let salvage = costs.salvage * leftover;
    let holding = costs.holding * leftover;
    let shortage = costs.shortage * unmet;
    let penalty = costs.penalty * unmet;
    InventoryAdjustment {
        salvage,
        holding,
        shortage,
        penalty,
        net: salvage - holding - shortage - penalty,
    }
}
