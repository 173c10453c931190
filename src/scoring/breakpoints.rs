/// How a value is compared against an ascending breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointMode {
    /// One point per breakpoint strictly exceeded. Stops at the first
    /// breakpoint not exceeded. Used for penalty factors.
    StrictGreater,
    /// One point per breakpoint met or exceeded, checking every breakpoint.
    /// Used for bonus factors.
    GteCumulative,
}

pub const ENERGY_KCAL: [f64; 10] = [50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0];
pub const SUGARS_G: [f64; 10] = [4.5, 9.0, 13.5, 18.0, 22.5, 27.0, 31.0, 36.0, 40.0, 45.0];
pub const SATURATED_FAT_G: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
pub const SODIUM_MG: [f64; 10] = [90.0, 180.0, 270.0, 360.0, 450.0, 540.0, 630.0, 720.0, 810.0, 900.0];

pub const FIBER_G: [f64; 5] = [0.9, 1.9, 2.8, 3.7, 4.7];
pub const PROTEIN_G: [f64; 5] = [1.6, 3.2, 4.8, 6.4, 8.0];

/// Convert a nutrient value into a point count.
///
/// Absent values score 0 points in either mode, as do non-finite values
/// (they only come from broken source data).
pub fn classify(value: Option<f64>, breakpoints: &[f64], mode: BreakpointMode) -> u8 {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return 0;
    };

    let points = match mode {
        BreakpointMode::StrictGreater => breakpoints
            .iter()
            .take_while(|&&limit| value > limit)
            .count(),
        BreakpointMode::GteCumulative => breakpoints
            .iter()
            .filter(|&&limit| value >= limit)
            .count(),
    };

    // Tables are at most 10 entries long
    points.min(u8::MAX as usize) as u8
}
