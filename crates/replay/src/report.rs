use std::fmt::Write;

use model::{
    statistics::{format_distance, format_duration, format_speed},
    RouteStatistics, SavedLocation,
};

const PENDING_SUBTITLE: &str = "...";

pub fn render_path(path: &[SavedLocation]) -> String {
    let mut out = String::new();
    for (index, location) in path.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<14} {:>11.6} {:>11.6}  {}",
            index + 1,
            location.title,
            location.position.latitude,
            location.position.longitude,
            location.subtitle.as_deref().unwrap_or(PENDING_SUBTITLE),
        );
    }
    out
}

pub fn render_statistics(statistics: &RouteStatistics) -> String {
    if !statistics.has_route() {
        return "No route recorded yet.".to_owned();
    }
    let mut out = statistics.to_string();
    if let (Some(start), Some(end)) = (statistics.start_time, statistics.end_time) {
        let _ = write!(out, "\nFrom {} to {}", start.to_rfc3339(), end.to_rfc3339());
    }
    out
}

/// A single line, for logging progress.
pub fn summary(statistics: &RouteStatistics) -> String {
    format!(
        "{} in {} ({})",
        format_distance(statistics.total_distance),
        format_duration(statistics.total_duration),
        format_speed(statistics.average_speed)
    )
}
