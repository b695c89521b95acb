pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = ms / 3_600_000;
        let mins = (ms % 3_600_000) / 60_000;
        format!("{}h {}m", hours, mins)
    }
}

/// Share of `part` in `whole`, as a display percentage.
pub fn format_ratio(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}

/// Render a CNAME chain as `a -> b -> c`.
pub fn format_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_720_000), "1h 2m");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(1, 4), "25.0%");
        assert_eq!(format_ratio(0, 0), "-");
    }

    #[test]
    fn test_format_chain() {
        let chain = vec!["a.example.com".to_string(), "b.herokuapp.com".to_string()];
        assert_eq!(format_chain(&chain), "a.example.com -> b.herokuapp.com");
    }
}
