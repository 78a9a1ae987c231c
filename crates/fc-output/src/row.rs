//! Plain data row types written by output backends.

/// One dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRow {
    pub cycle:          u64,
    /// Agent location before the move.
    pub from_node:      u32,
    pub destination:    u32,
    /// `"refill"` or `"allocate"`.
    pub action:         &'static str,
    /// Travel time, plus remaining charge time for refills.
    pub cost:           f64,
    pub hops:           u32,
    pub charged:        u32,
    /// Agent inventory after the effect.
    pub inventory:      u32,
    pub average_charge: f64,
    pub total_travel:   f64,
    pub churn_actions:  u32,
}

/// One traversed edge of a cycle's route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLegRow {
    pub cycle:       u64,
    /// 0-based position along the route.
    pub leg:         u32,
    pub from_node:   u32,
    pub to_node:     u32,
    pub travel_time: f64,
}

/// One parking site's state at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteRow {
    pub cycle:         u64,
    pub site_id:       u32,
    pub vehicle_count: u32,
    /// 100 for an empty site.
    pub mean_charge:   f64,
}
