//! Meal pricing: the minimum price for a set of add-ons and the budget
//! range the user may pick from.

use serde::Serialize;

use super::model::AddOnTier;

pub const BASE_PRICE: u32 = 110;
pub const PROTEIN_SURGE: u32 = 40;
pub const EXTRA_SERVING_SURGE: u32 = 20;
/// Premium package price, replaces the protein surge.
pub const GYM_BRO_SURGE: u32 = 100;

/// Fixed ceiling, independent of selections.
pub const MAX_BUDGET: u32 = 500;
pub const BUDGET_STEP: u32 = 10;
pub const DEFAULT_BUDGET: u32 = BASE_PRICE;

/// Minimum allowed price per meal.
pub fn min_price(add_on: AddOnTier, needs_extra_serving: bool) -> u32 {
    let surge = match add_on {
        AddOnTier::Premium => GYM_BRO_SURGE,
        AddOnTier::Protein => PROTEIN_SURGE,
        AddOnTier::None => 0,
    };
    let serving = if needs_extra_serving {
        EXTRA_SERVING_SURGE
    } else {
        0
    };
    BASE_PRICE + surge + serving
}

/// Force `budget` into `[min, MAX_BUDGET]`. A budget below the minimum is
/// raised to exactly the minimum.
pub fn clamp_budget(budget: u32, min: u32) -> u32 {
    budget.clamp(min, MAX_BUDGET.max(min))
}

/// Snap a user-picked budget to the slider step, then clamp it.
pub fn snap_budget(requested: u32, min: u32) -> u32 {
    let snapped = requested.saturating_add(BUDGET_STEP / 2) / BUDGET_STEP * BUDGET_STEP;
    clamp_budget(snapped, min)
}

/// Render a rupee amount for display.
pub fn format_rupees(amount: u32) -> String {
    format!("₹{amount}")
}

/// Slider bounds for the budget step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl BudgetRange {
    pub fn for_selection(add_on: AddOnTier, needs_extra_serving: bool) -> Self {
        Self {
            min: min_price(add_on, needs_extra_serving),
            max: MAX_BUDGET,
            step: BUDGET_STEP,
        }
    }
}

/// One line of the price summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceLine {
    pub label: &'static str,
    pub amount: u32,
}

/// Itemised minimum price, as shown under the budget slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
    pub total: u32,
}

impl PriceBreakdown {
    pub fn for_selection(add_on: AddOnTier, needs_extra_serving: bool) -> Self {
        let mut lines = vec![PriceLine {
            label: "Base Price",
            amount: BASE_PRICE,
        }];
        match add_on {
            AddOnTier::Premium => lines.push(PriceLine {
                label: "Gym Bro Premium",
                amount: GYM_BRO_SURGE,
            }),
            AddOnTier::Protein => lines.push(PriceLine {
                label: "Protein Boost",
                amount: PROTEIN_SURGE,
            }),
            AddOnTier::None => {}
        }
        if needs_extra_serving {
            lines.push(PriceLine {
                label: "Extra Serving",
                amount: EXTRA_SERVING_SURGE,
            });
        }
        let total = lines.iter().map(|l| l.amount).sum();
        Self { lines, total }
    }
}
