/// Pollen amounts are carried as f64 but every stored or summed value is
/// first rounded to 8 decimal places, and persisted values are scaled to
/// integer micro-pollen so arithmetic on them is exact.
pub const MICRO_PER_POLLEN: f64 = 1_000_000.0;

pub fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

pub fn to_micro_pollen(pollen: f64) -> i64 {
    (pollen * MICRO_PER_POLLEN).round() as i64
}

pub fn from_micro_pollen(micro: i64) -> f64 {
    micro as f64 / MICRO_PER_POLLEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round8_fixes_drift() {
        assert_eq!(round8(0.1 + 0.2), 0.3);
        assert_eq!(round8(1.000000004), 1.0);
        assert_eq!(round8(1.000000006), 1.00000001);
    }

    #[test]
    fn micro_pollen_round_trips() {
        for pollen in [0.0, 0.000001, 0.015, 1.5, 12.345678, 10_000.25] {
            let micro = to_micro_pollen(pollen);
            assert_eq!(from_micro_pollen(micro), pollen);
        }
    }

    #[test]
    fn micro_pollen_is_integer_scaled() {
        assert_eq!(to_micro_pollen(1.5), 1_500_000);
        assert_eq!(to_micro_pollen(0.000001), 1);
        assert_eq!(from_micro_pollen(2_250_000), 2.25);
    }
}
