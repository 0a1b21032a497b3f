use std::time::SystemTime;

/// Cumulative active energy for the current workout statistics window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub kcal: f64,
    pub at: SystemTime,
}

/// One statistic delivered by the workout data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    ActiveEnergy(EnergySample),
    HeartRate { bpm: f64, at: SystemTime },
    Distance { meters: f64, at: SystemTime },
}
