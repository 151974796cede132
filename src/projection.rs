//! Attendance percentage and "what-if" arithmetic.
//!
//! Every function here is pure over `(present, total, target)`, so the same
//! code serves a single subject and the aggregate across all subjects.
//! Comparisons are done on integers scaled by 100 to keep the boundary
//! cases exact (75% of 40 is exactly 30, never 29.999...).

use serde::Serialize;

/// `present / total * 100`, defined as 0 when nothing was recorded yet.
pub fn percent(present: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    present as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// No classes recorded.
    NoData,
    /// Target is 0%; absences never matter.
    Unrestricted,
    /// At or above target; `classes` more absences keep it there.
    CanMiss { classes: u64 },
    /// Exactly at 100% with a 100% target.
    AttendAll,
    /// Below target; attending the next `classes` reaches it.
    MustAttend { classes: u64 },
    /// 100% target after at least one absence.
    Unreachable,
}

impl Projection {
    /// Maximum extra absences that keep the target, if bounded.
    pub fn safe_misses(&self) -> Option<u64> {
        match self {
            Self::CanMiss { classes } => Some(*classes),
            Self::AttendAll => Some(0),
            _ => None,
        }
    }

    /// Minimum consecutive attendances needed to reach the target.
    pub fn required_attends(&self) -> Option<u64> {
        match self {
            Self::MustAttend { classes } => Some(*classes),
            _ => None,
        }
    }

    pub fn message(&self, target_percent: u8) -> String {
        match self {
            Self::NoData => "No data yet.".to_string(),
            Self::Unrestricted => "Target is 0%, no restriction.".to_string(),
            Self::CanMiss { classes: 0 } => {
                format!("No more absences allowed to maintain {target_percent}%")
            }
            Self::CanMiss { classes } => format!(
                "You can miss {classes} more {} and still keep {target_percent}%",
                plural(*classes)
            ),
            Self::AttendAll => {
                "Attend upcoming classes without missing any to maintain 100%".to_string()
            }
            Self::MustAttend { classes } => format!(
                "Attend next {classes} {} to reach {target_percent}%",
                plural(*classes)
            ),
            Self::Unreachable => {
                "Target unreachable: prior absences permanently preclude 100%".to_string()
            }
        }
    }
}

fn plural(count: u64) -> &'static str {
    if count == 1 { "class" } else { "classes" }
}

/// Projects how far `present / total` is from `target_percent`.
///
/// Above target this is the largest `n` with `present / (total + n) >= z`;
/// below target the smallest `k` with `(present + k) / (total + k) >= z`.
/// Targets above 100 are treated as 100.
pub fn project(present: u64, total: u64, target_percent: u8) -> Projection {
    if total == 0 {
        return Projection::NoData;
    }

    let z = u128::from(target_percent.min(100));
    let scaled_present = u128::from(present) * 100;
    let scaled_target = z * u128::from(total);

    if scaled_present >= scaled_target {
        if z == 0 {
            return Projection::Unrestricted;
        }
        let classes = saturate((scaled_present - scaled_target) / z);
        if z == 100 && classes == 0 {
            return Projection::AttendAll;
        }
        return Projection::CanMiss { classes };
    }

    if z == 100 {
        return Projection::Unreachable;
    }

    let deficit = scaled_target - scaled_present;
    Projection::MustAttend {
        classes: saturate(deficit.div_ceil(100 - z)),
    }
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatIfAction {
    Miss,
    Attend,
}

impl WhatIfAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "miss" | "bunk" => Some(Self::Miss),
            "attend" => Some(Self::Attend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIf {
    pub current_percent: f64,
    pub projected_percent: f64,
    pub present: u64,
    pub total: u64,
    pub meets_target: bool,
}

/// Percent after missing or attending the next `count` classes.
pub fn what_if(
    present: u64,
    total: u64,
    target_percent: u8,
    action: WhatIfAction,
    count: u64,
) -> WhatIf {
    let (new_present, new_total) = match action {
        WhatIfAction::Miss => (present, total.saturating_add(count)),
        WhatIfAction::Attend => (present.saturating_add(count), total.saturating_add(count)),
    };
    WhatIf {
        current_percent: percent(present, total),
        projected_percent: percent(new_present, new_total),
        present: new_present,
        total: new_total,
        meets_target: u128::from(new_present) * 100
            >= u128::from(target_percent.min(100)) * u128::from(new_total),
    }
}
