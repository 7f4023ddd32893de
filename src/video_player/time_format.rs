// SPDX-License-Identifier: MPL-2.0
//! Duration display.

/// Formats seconds as `m:ss`, flooring both parts.
///
/// Minutes are not wrapped into hours. Negative or non-finite input shows as `0:00`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_fractional_seconds() {
        assert_eq!(format_duration(125.4), "2:05");
        assert_eq!(format_duration(59.999), "0:59");
    }

    #[test]
    fn pads_seconds_to_two_digits() {
        assert_eq!(format_duration(10.0), "0:10");
        assert_eq!(format_duration(61.0), "1:01");
        assert_eq!(format_duration(0.0), "0:00");
    }

    #[test]
    fn long_durations_keep_counting_minutes() {
        assert_eq!(format_duration(3_725.0), "62:05");
    }

    #[test]
    fn invalid_input_is_zero() {
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
        assert_eq!(format_duration(f64::INFINITY), "0:00");
    }
}
