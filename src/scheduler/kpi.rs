//! Timetable quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Coverage | Fraction of sessions with a real teacher |
//! | Sentinel count | Sessions left to "No teacher available" |
//! | Teacher load | Slots taught per teacher per week |
//! | Max daily load | Most slots one teacher teaches on one day |
//! | Room utilization | Busy fraction of each used room's week |

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{RoomId, Schedule, TeacherId};

/// Timetable performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    pub session_count: usize,
    pub sentinel_count: usize,
    /// Fraction of sessions with a real teacher (0.0..1.0).
    pub coverage_rate: f64,
    /// Slots per teacher per week.
    pub teacher_loads: HashMap<TeacherId, u32>,
    /// Highest number of slots any teacher teaches on a single day.
    pub max_daily_teacher_load: u32,
    /// Per-room utilization over the week.
    pub utilization_by_room: HashMap<RoomId, f64>,
    /// Mean of `utilization_by_room` (0.0 when no room is used).
    pub avg_room_utilization: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule.
    ///
    /// # Arguments
    /// * `schedule` - The produced schedule.
    /// * `cells_per_week` - Days × slots of the grid.
    pub fn calculate(schedule: &Schedule, cells_per_week: usize) -> Self {
        let session_count = schedule.assignment_count();
        let sentinel_count = schedule.sentinel_count();
        let coverage_rate = if session_count == 0 {
            1.0
        } else {
            (session_count - sentinel_count) as f64 / session_count as f64
        };

        let mut daily: HashMap<(TeacherId, usize), u32> = HashMap::new();
        for a in &schedule.assignments {
            if let Some(t) = a.placement.teacher.id() {
                *daily.entry((t, a.placement.start.day)).or_insert(0) += u32::from(a.placement.span);
            }
        }
        let max_daily_teacher_load = daily.values().copied().max().unwrap_or(0);

        let mut utilization_by_room = HashMap::new();
        for a in &schedule.assignments {
            let room = a.placement.room;
            if utilization_by_room.contains_key(&room) {
                continue;
            }
            if let Some(u) = schedule.room_utilization(room, cells_per_week) {
                utilization_by_room.insert(room, u);
            }
        }
        let avg_room_utilization = if utilization_by_room.is_empty() {
            0.0
        } else {
            utilization_by_room.values().sum::<f64>() / utilization_by_room.len() as f64
        };

        Self {
            session_count,
            sentinel_count,
            coverage_rate,
            teacher_loads: schedule.teacher_loads(),
            max_daily_teacher_load,
            utilization_by_room,
            avg_room_utilization,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, max_daily_load: u32) -> bool {
        self.coverage_rate >= min_coverage && self.max_daily_teacher_load <= max_daily_load
    }
}
