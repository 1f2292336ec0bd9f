// Clinical Range Table
// Normalizes raw biomarker values onto a 0-100 scale

/// Neutral score substituted when a biomarker is missing or unknown
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Reference range for one biomarker type.
///
/// For standard ranges, values at or above `optimal` score 100 and values at
/// or below `min` score 0. Inverted ranges flip that: lower is better, with
/// `optimal` naming the good low value and `max` the bad high one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicalRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
    pub inverted: bool,
}

const fn standard(min: f64, max: f64, optimal: f64) -> ClinicalRange {
    ClinicalRange {
        min,
        max,
        optimal,
        inverted: false,
    }
}

const fn inverted(min: f64, max: f64, optimal: f64) -> ClinicalRange {
    ClinicalRange {
        min,
        max,
        optimal,
        inverted: true,
    }
}

/// Reference range for a biomarker type, `None` for unknown types
pub fn range_for(biomarker_type: &str) -> Option<ClinicalRange> {
    let range = match biomarker_type {
        // Sleep (hours, percent, minutes)
        "sleep_duration" => standard(4.0, 10.0, 8.0),
        "sleep_debt" => inverted(0.0, 4.0, 0.0),
        "sleep_regularity" => standard(0.0, 100.0, 85.0),
        "sleep_efficiency" => standard(50.0, 100.0, 90.0),
        "sleep_latency" => inverted(0.0, 60.0, 10.0),

        // Cardiovascular
        "heart_rate_variability" => standard(20.0, 150.0, 80.0),
        "resting_heart_rate" => inverted(40.0, 100.0, 52.0),
        "recovery_heart_rate" => standard(10.0, 70.0, 45.0),
        "heart_rate_sleep" => inverted(40.0, 90.0, 55.0),
        "respiratory_rate" => inverted(10.0, 24.0, 14.0),
        "vo2_max" => standard(20.0, 65.0, 50.0),

        // Activity
        "steps" => standard(0.0, 25000.0, 10000.0),
        "active_energy_burned" => standard(0.0, 1500.0, 600.0),
        "activity_duration" => standard(0.0, 240.0, 60.0),
        "exercise_duration" => standard(0.0, 180.0, 45.0),
        "active_hours" => standard(0.0, 16.0, 10.0),
        "floors_climbed" => standard(0.0, 40.0, 10.0),
        "sedentary_duration" => inverted(0.0, 960.0, 240.0),

        // Wellbeing
        "stress_level" => inverted(0.0, 100.0, 25.0),

        _ => return None,
    };
    Some(range)
}

/// Normalize a raw biomarker value onto a 0-100 scale. Unknown biomarker
/// types get the neutral score rather than failing the computation.
pub fn normalize(biomarker_type: &str, value: f64) -> f64 {
    match range_for(biomarker_type) {
        Some(range) => normalize_with(range, value),
        None => NEUTRAL_SCORE,
    }
}

fn normalize_with(range: ClinicalRange, value: f64) -> f64 {
    let score = if range.inverted {
        let span = range.max - range.optimal;
        if span <= 0.0 {
            return NEUTRAL_SCORE;
        }
        (range.max - value) / span * 100.0
    } else {
        let span = range.optimal - range.min;
        if span <= 0.0 {
            return NEUTRAL_SCORE;
        }
        (value - range.min) / span * 100.0
    };
    score.clamp(0.0, 100.0)
}
