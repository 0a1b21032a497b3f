//! Text blocks for the watch face.

/// Three-line energy block: kcal, current and projected glucose.
///
/// All three values are whole numbers by the time they get here and are
/// shown with one decimal, e.g. `100.0 cal`.
pub fn energy_block(kcal: f64, current_bg: f64, projected_bg: f64) -> String {
    format!("{kcal:.1} cal\nC: {current_bg:.1} mg/dL\nF: {projected_bg:.1} mg/dL")
}

pub fn heart_rate_line(bpm: f64) -> String {
    format!("{:.1} BPM", bpm.round())
}
