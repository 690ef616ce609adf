/// Time formatting helpers.
pub mod time {
    use std::time::Duration;

    /// Human-readable duration for task summaries.
    pub fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();

        if total_secs < 60 {
            format!("{}s", total_secs)
        } else if total_secs < 3600 {
            format!("{}m {}s", total_secs / 60, total_secs % 60)
        } else {
            format!(
                "{}h {}m {}s",
                total_secs / 3600,
                (total_secs % 3600) / 60,
                total_secs % 60
            )
        }
    }
}

/// Byte size formatting for result listings.
pub mod format {
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

        let mut size = bytes as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", bytes, UNITS[unit])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn durations_format_across_scales() {
        assert_eq!(time::format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(time::format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(time::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn byte_sizes_format_across_scales() {
        assert_eq!(format::format_bytes(512), "512 B");
        assert_eq!(format::format_bytes(2048), "2.0 KB");
        assert_eq!(format::format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
