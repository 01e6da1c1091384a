use crate::core::time::Playback;

use super::snapshot::OrbitSnapshot;

impl OrbitSnapshot {
    /// One-line status read by the accessibility narrator. Built from the
    /// snapshot alone.
    pub fn status_sentence(&self) -> String {
        let playback = match &self.playback {
            Playback::Paused => "Simulation paused".to_string(),
            Playback::Running => {
                let days = self.speed.abs();
                let unit = if days == 1.0 { "day" } else { "days" };
                let direction = if self.speed < 0.0 { " in reverse" } else { "" };
                format!("Simulation running{direction} at {} {unit} per second", trim_number(days))
            }
            Playback::Cinematic { track, .. } => format!("Cinematic {track} playing"),
        };

        let selection = match self.selected_planet() {
            Some(p) => format!(
                "{} selected, {:.2} AU from the Sun{}.",
                p.name,
                p.distance_au,
                if p.stale { ", position approximate" } else { "" }
            ),
            None => "No planet selected.".to_string(),
        };

        let planets = self.planets.iter().filter(|p| p.body.is_planet()).count();
        format!("{playback} on {}. {selection} {planets} planets shown.", self.date)
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
