use std::time::Duration;

/// Formats a duration as `mm:ss.cc`, flooring at every unit boundary.
/// Minutes are not folded into hours, so long runs read e.g. `125:00.00`.
pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let total_secs = total_ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let centis = (total_ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

pub trait TrimmedNonEmpty {
    /// The trimmed string, or `None` when nothing but whitespace is left.
    fn trimmed_non_empty(&self) -> Option<&str>;
}

impl TrimmedNonEmpty for str {
    fn trimmed_non_empty(&self) -> Option<&str> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(65432)), "01:05.43");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:59.99");
        assert_eq!(format_elapsed(Duration::from_millis(60_000)), "01:00.00");
        assert_eq!(format_elapsed(Duration::from_secs(125 * 60)), "125:00.00");
    }

    #[test]
    fn test_format_elapsed_floors_instead_of_rounding() {
        assert_eq!(format_elapsed(Duration::from_millis(9)), "00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(1_999)), "00:01.99");
        assert_eq!(format_elapsed(Duration::from_micros(10_999)), "00:00.01");
    }

    #[test]
    fn test_trimmed_non_empty() {
        assert_eq!("  Ana ".trimmed_non_empty(), Some("Ana"));
        assert_eq!("   ".trimmed_non_empty(), None);
        assert_eq!("".trimmed_non_empty(), None);
    }
}
