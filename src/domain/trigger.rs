//! Trigger levels below a yearly reference price.

/// Number of trigger levels per symbol.
pub const LEVELS: usize = 3;

/// Trigger prices for `reference` at each percentage depth in `offsets`, rounded to cents.
///
/// `offsets` are percentages (`4.13` means 4.13%), shallowest first, so the result is
/// descending.
pub fn triggers(reference: f64, offsets: &[f64; LEVELS]) -> [f64; LEVELS] {
    offsets.map(|offset| round2(reference * (1.0 - offset / 100.0)))
}

/// Label attached to a buy fired at trigger `index`: the configured depth truncated to a
/// whole percent, e.g. `4.13` -> `"4%"`.
pub fn level_label(offsets: &[f64; LEVELS], index: usize) -> String {
    format!("{}%", offsets[index].trunc() as i64)
}

/// Rounds to cents, exact halves to the even cent.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn triggers_round_number_reference() {
        let t = triggers(100.0, &[5.0, 10.0, 15.0]);
        assert_relative_eq!(t[0], 95.0);
        assert_relative_eq!(t[1], 90.0);
        assert_relative_eq!(t[2], 85.0);
    }

    #[test]
    fn triggers_round_to_cents() {
        // 2456.7 * 0.9587 = 2355.238..., * 0.9174 = 2253.776..., * 0.8761 = 2152.315...
        let t = triggers(2456.7, &[4.13, 8.26, 12.39]);
        assert_relative_eq!(t[0], 2355.24);
        assert_relative_eq!(t[1], 2253.78);
        assert_relative_eq!(t[2], 2152.31);
    }

    #[test]
    fn triggers_round_half_cent_to_even() {
        // 100.25 * 0.5 = 50.125 exactly.
        let t = triggers(100.25, &[50.0, 60.0, 70.0]);
        assert_relative_eq!(t[0], 50.12);
        assert_relative_eq!(t[1], 40.1);
        assert_relative_eq!(round2(0.135), 0.14);
        assert_relative_eq!(round2(2.5), 2.5);
    }

    #[test]
    fn triggers_descend_for_ascending_offsets() {
        let t = triggers(731.15, &[4.13, 8.26, 12.39]);
        assert!(t[0] > t[1] && t[1] > t[2]);
    }

    #[test]
    fn level_label_truncates_configured_offset() {
        let offsets = [4.13, 8.26, 12.39];
        assert_eq!(level_label(&offsets, 0), "4%");
        assert_eq!(level_label(&offsets, 1), "8%");
        assert_eq!(level_label(&offsets, 2), "12%");
        assert_eq!(level_label(&[5.0, 10.0, 20.0], 2), "20%");
    }
}
