use super::spec::Tick;

/// Exponents of the labelled concentration ticks: 2^-27, 2^-25, …, 2^5.
pub const TICK_EXPONENTS: [i32; 17] = [
    -27, -25, -23, -21, -19, -17, -15, -13, -11, -9, -7, -5, -3, -1, 1, 3, 5,
];

/// Left end of the horizontal HC guides.
pub const LINE_START_EXPONENT: i32 = -27;

/// Ticks at or below this value stay unlabelled.
const LABEL_THRESHOLD: f64 = 0.001;

pub fn line_start() -> f64 {
    f64::from(LINE_START_EXPONENT).exp2()
}

/// Round to 3 decimals and print without trailing zeros.
///
/// Rounding works on the exact binary value, ties to even, so `0.0625`
/// gives `0.062` while `0.0025` (slightly above the tie) gives `0.003`.
pub fn format_concentration(value: f64) -> String {
    let rounded: f64 = format!("{value:.3}").parse().unwrap_or(value);
    // -0.0 would print as "-0"
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}

pub fn tick_label(value: f64) -> String {
    if value > LABEL_THRESHOLD {
        format_concentration(value)
    } else {
        String::new()
    }
}

/// The fixed concentration ticks of the log2 x axis.
pub fn concentration_ticks() -> Vec<Tick> {
    TICK_EXPONENTS
        .iter()
        .map(|&k| {
            let value = f64::from(k).exp2();
            Tick {
                value,
                label: tick_label(value),
            }
        })
        .collect()
}
