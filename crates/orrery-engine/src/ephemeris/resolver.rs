//! Ephemeris resolver: the only producer of `PositionSample` values.
//!
//! Memoizes the most recent sample per body, keyed by exact instant. The
//! instant changes on nearly every tick, so the cache exists to deduplicate
//! requests inside one frame, not to reuse positions across frames.

use glam::DVec3;
use serde::Serialize;

use crate::bodies::{Body, BODY_COUNT};
use crate::core::instant::Instant;
use crate::error::OracleError;
use super::oracle::{EphemerisOracle, ReferenceFrame};

/// A body's position resolved for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    pub body: Body,
    /// Instant the position was computed for. For a stale sample this is
    /// older than the instant it is being shown at.
    pub instant: Instant,
    /// Heliocentric ecliptic position (AU).
    pub position: DVec3,
    /// True when the oracle failed and this is a substitute.
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    /// Instant of the most recent resolution attempt.
    attempted: Option<Instant>,
    /// Result handed out for `attempted`.
    current: Option<PositionSample>,
    /// Most recent fresh sample.
    last_good: Option<PositionSample>,
    /// Inside a streak of oracle failures.
    failing: bool,
}

pub struct EphemerisResolver {
    oracle: Box<dyn EphemerisOracle>,
    slots: [Slot; BODY_COUNT],
    oracle_calls: u64,
    failures: u64,
}

impl EphemerisResolver {
    pub fn new(oracle: Box<dyn EphemerisOracle>) -> Self {
        Self {
            oracle,
            slots: [Slot::default(); BODY_COUNT],
            oracle_calls: 0,
            failures: 0,
        }
    }

    /// Total oracle invocations so far.
    pub fn oracle_calls(&self) -> u64 {
        self.oracle_calls
    }

    /// Total oracle failures so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Resolve `body` at `instant`. Never fails: on oracle failure returns the
    /// last known-good sample (or a catalog placeholder) flagged stale.
    pub fn resolve(&mut self, body: Body, instant: Instant) -> PositionSample {
        let slot = self.slots[body as usize];
        if slot.attempted == Some(instant) {
            if let Some(sample) = slot.current {
                return sample;
            }
        }

        let result = self.call_oracle(body, instant, ReferenceFrame::Heliocentric);
        let slot = &mut self.slots[body as usize];
        let sample = match result {
            Ok(position) => {
                if slot.failing {
                    log::info!("Ephemeris for {:?} recovered at {}", body, instant);
                    slot.failing = false;
                }
                let sample = PositionSample {
                    body,
                    instant,
                    position,
                    stale: false,
                };
                slot.last_good = Some(sample);
                sample
            }
            Err(err) => {
                self.failures += 1;
                if slot.failing {
                    log::debug!("Ephemeris for {:?} still failing: {}", body, err);
                } else {
                    log::warn!("Ephemeris for {:?} failed, reusing last sample: {}", body, err);
                    slot.failing = true;
                }
                match slot.last_good {
                    Some(good) => PositionSample { stale: true, ..good },
                    None => PositionSample {
                        body,
                        instant,
                        position: nominal_position(body),
                        stale: true,
                    },
                }
            }
        };
        slot.attempted = Some(instant);
        slot.current = Some(sample);
        sample
    }

    /// Resolve every body for one tick, in the order given.
    pub fn resolve_batch(&mut self, bodies: &[Body], instant: Instant) -> Vec<PositionSample> {
        bodies.iter().map(|&body| self.resolve(body, instant)).collect()
    }

    /// Uncached oracle call, used for orbit-path sampling.
    pub(crate) fn resolve_uncached(
        &mut self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError> {
        self.call_oracle(body, instant, frame)
    }

    fn call_oracle(
        &mut self,
        body: Body,
        instant: Instant,
        frame: ReferenceFrame,
    ) -> Result<DVec3, OracleError> {
        self.oracle_calls += 1;
        let position = self.oracle.resolve_position(body, instant, frame)?;
        if !position.is_finite() {
            return Err(OracleError::NonFinite(body));
        }
        Ok(position)
    }
}

/// Placeholder used before any good sample exists: the body at its mean
/// distance on the +X axis (parent distances added for moons).
pub fn nominal_position(body: Body) -> DVec3 {
    let mut x = body.info().semi_major_axis_au;
    let mut parent = body.parent();
    while let Some(p) = parent {
        x += p.info().semi_major_axis_au;
        parent = p.parent();
    }
    DVec3::new(x, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::ephemeris::oracle::FnOracle;

    /// Oracle that puts each body at (id, days, 0) and counts calls.
    fn counting_oracle(calls: Rc<Cell<u32>>) -> Box<dyn EphemerisOracle> {
        Box::new(FnOracle(
            move |body: Body, instant: Instant, _frame: ReferenceFrame| -> Result<DVec3, OracleError> {
                calls.set(calls.get() + 1);
                Ok(DVec3::new(body.id() as f64, instant.days(), 0.0))
            },
        ))
    }

    #[test]
    fn same_instant_is_deduplicated() {
        let calls = Rc::new(Cell::new(0));
        let mut r = EphemerisResolver::new(counting_oracle(calls.clone()));
        let t = Instant::from_days(10.0);
        let a = r.resolve(Body::Earth, t);
        let b = r.resolve(Body::Earth, t);
        assert_eq!(a, b);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn later_instant_never_served_from_cache() {
        let calls = Rc::new(Cell::new(0));
        let mut r = EphemerisResolver::new(counting_oracle(calls.clone()));
        let t1 = Instant::from_days(1.0);
        let t2 = Instant::from_days(1.0 + 1e-9);
        let s1 = r.resolve(Body::Venus, t1);
        let s2 = r.resolve(Body::Venus, t2);
        assert_eq!(s1.instant, t1);
        assert_eq!(s2.instant, t2);
        assert_ne!(s1.position, s2.position);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn batch_costs_one_call_per_body() {
        let calls = Rc::new(Cell::new(0));
        let mut r = EphemerisResolver::new(counting_oracle(calls.clone()));
        let t = Instant::from_days(3.0);
        let bodies = Body::PLANETS;
        // several consumers asking for the same frame
        for _ in 0..5 {
            let samples = r.resolve_batch(&bodies, t);
            assert_eq!(samples.len(), bodies.len());
        }
        assert_eq!(calls.get(), bodies.len() as u32);
        assert_eq!(r.oracle_calls(), bodies.len() as u64);
    }

    #[test]
    fn failing_body_keeps_last_good_sample() {
        let fail_mars = Rc::new(Cell::new(false));
        let flag = fail_mars.clone();
        let oracle = FnOracle(move |body: Body, instant: Instant, _frame: ReferenceFrame| {
            if body == Body::Mars && flag.get() {
                return Err(OracleError::OutOfRange { body, instant });
            }
            Ok(DVec3::new(body.id() as f64, instant.days(), 0.0))
        });
        let mut r = EphemerisResolver::new(Box::new(oracle));

        let t0 = Instant::from_days(0.0);
        let before = r.resolve(Body::Mars, t0);

        fail_mars.set(true);
        let t1 = Instant::from_days(1.0);
        let after = r.resolve(Body::Mars, t1);
        assert!(after.stale);
        assert_eq!(after.position, before.position);
        assert_eq!(after.instant, t0);

        let earth = r.resolve(Body::Earth, t1);
        assert!(!earth.stale);
        assert_eq!(earth.instant, t1);

        fail_mars.set(false);
        let t2 = Instant::from_days(2.0);
        let recovered = r.resolve(Body::Mars, t2);
        assert!(!recovered.stale);
        assert_eq!(recovered.instant, t2);
    }

    #[test]
    fn failure_is_not_retried_within_a_frame() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let oracle = FnOracle(move |body: Body, _instant: Instant, _frame: ReferenceFrame| {
            counter.set(counter.get() + 1);
            Err(OracleError::UnsupportedBody(body))
        });
        let mut r = EphemerisResolver::new(Box::new(oracle));
        let t = Instant::from_days(4.0);
        r.resolve(Body::Pluto, t);
        r.resolve(Body::Pluto, t);
        assert_eq!(calls.get(), 1);
        assert_eq!(r.failures(), 1);
    }

    #[test]
    fn first_failure_publishes_placeholder() {
        let oracle = FnOracle(
            |_body: Body, _instant: Instant, _frame: ReferenceFrame| -> Result<DVec3, OracleError> {
                Ok(DVec3::new(f64::NAN, 0.0, 0.0))
            },
        );
        let mut r = EphemerisResolver::new(Box::new(oracle));
        let s = r.resolve(Body::Moon, Instant::J2000);
        assert!(s.stale);
        assert!((s.position.x - 1.00257).abs() < 1e-9);
    }
}
