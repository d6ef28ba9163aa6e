/// A millisecond duration decomposed into display fields. Subsecond
/// resolution is centiseconds, matching the two-digit display column.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TimeParts {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub centis: u64,
}

impl TimeParts {
    pub fn clock_text(&self) -> String {
        format!(
            "{}:{}:{}.{}",
            zero_pad(self.hours, 2),
            zero_pad(self.minutes, 2),
            zero_pad(self.seconds, 2),
            zero_pad(self.centis, 2)
        )
    }
}

pub fn decompose(duration_ms: u64) -> TimeParts {
    TimeParts {
        hours: duration_ms / 3_600_000,
        minutes: (duration_ms / 60_000) % 60,
        seconds: (duration_ms / 1_000) % 60,
        centis: (duration_ms % 1_000) / 10,
    }
}

/// Left-pads the decimal representation with '0' to `width`. Values that
/// already need more digits are returned unpadded, never truncated.
pub fn zero_pad(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_zero() {
        assert_eq!(
            decompose(0),
            TimeParts {
                hours: 0,
                minutes: 0,
                seconds: 0,
                centis: 0,
            }
        );
    }

    #[test]
    fn decomposes_complex_time() {
        let parts = decompose(3_723_500);
        assert_eq!(
            parts,
            TimeParts {
                hours: 1,
                minutes: 2,
                seconds: 3,
                centis: 50,
            }
        );
    }

    #[test]
    fn decompose_round_trips_to_centisecond_resolution() {
        for ms in [0_u64, 9, 10, 999, 1_000, 59_999, 3_600_000, 86_399_990] {
            let parts = decompose(ms);
            let rebuilt = parts.hours * 3_600_000
                + parts.minutes * 60_000
                + parts.seconds * 1_000
                + parts.centis * 10;
            assert_eq!(rebuilt, (ms / 10) * 10, "round trip for {ms}");
        }
    }

    #[test]
    fn hours_are_unbounded() {
        let parts = decompose(100 * 3_600_000);
        assert_eq!(parts.hours, 100);
        assert_eq!(parts.minutes, 0);
    }

    #[test]
    fn zero_pad_pads_and_never_truncates() {
        assert_eq!(zero_pad(5, 2), "05");
        assert_eq!(zero_pad(123, 3), "123");
        assert_eq!(zero_pad(0, 3), "000");
        assert_eq!(zero_pad(1234, 2), "1234");
    }

    #[test]
    fn clock_text_uses_two_digit_columns() {
        assert_eq!(decompose(3_723_500).clock_text(), "01:02:03.50");
        assert_eq!(decompose(0).clock_text(), "00:00:00.00");
    }
}
