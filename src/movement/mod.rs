pub mod geodesy;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::types::constants::KNOTS_TO_MPS;
use crate::types::{normalize_course, Kinematics, Position};
use geodesy::{course_change, destination, distance_m, initial_bearing};

#[cfg(test)]
mod tests;

/// How a vessel moves between updates.
///
/// Each variant carries its own progress (track anchor, circle phase, waypoint index), so the
/// model is chosen once at scenario load and then driven only through [`MovementModel::advance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementModel {
    Linear(LinearModel),
    Circular(CircularModel),
    RandomWalk(RandomWalkModel),
    Waypoint(WaypointModel),
}

impl Default for MovementModel {
    fn default() -> Self {
        MovementModel::Linear(LinearModel::default())
    }
}

/// Constant nominal course and speed with bounded jitter that does not accumulate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearModel {
    /// Maximum speed deviation from nominal, in knots
    pub speed_variation: f64,
    /// Maximum course deviation from nominal, in degrees
    pub course_variation: f64,
    /// Maximum reported position deviation from the nominal track, in degrees
    pub position_noise: f64,
    #[serde(skip)]
    track: Option<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Track {
    position: Position,
    speed_knots: f64,
    course_deg: f64,
}

/// Constant-rate turn around a fixed centre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircularModel {
    /// Degrees per minute, positive to starboard
    pub turn_rate: f64,
    #[serde(skip)]
    circle: Option<Circle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Circle {
    center: Position,
    radius_m: f64,
    /// Bearing from the centre to the starting point
    start_bearing: f64,
    start_course: f64,
    elapsed_s: f64,
}

/// Bounded random walk of course and speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkModel {
    /// Largest speed change per update, in knots
    pub speed_step: f64,
    /// Largest course change per update, in degrees
    pub course_step: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for RandomWalkModel {
    fn default() -> Self {
        Self {
            speed_step: 0.5,
            course_step: 5.0,
            min_speed: 0.0,
            max_speed: 30.0,
        }
    }
}

/// Steer through a list of waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointModel {
    pub waypoints: Vec<Position>,
    /// A waypoint counts as reached within this distance
    pub arrival_radius_m: f64,
    /// Restart at the first waypoint instead of holding at the last
    pub cyclic: bool,
    /// Transit speed; the initial speed is used when unset
    pub speed_knots: Option<f64>,
    #[serde(skip)]
    next: usize,
    #[serde(skip)]
    holding: bool,
}

impl Default for WaypointModel {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            arrival_radius_m: 50.0,
            cyclic: false,
            speed_knots: None,
            next: 0,
            holding: false,
        }
    }
}

impl LinearModel {
    pub fn new(speed_variation: f64, course_variation: f64, position_noise: f64) -> Self {
        Self {
            speed_variation: speed_variation.max(0.0),
            course_variation: course_variation.max(0.0),
            position_noise: position_noise.max(0.0),
            track: None,
        }
    }
}

impl CircularModel {
    pub fn new(turn_rate: f64) -> Self {
        Self { turn_rate, circle: None }
    }
}

impl WaypointModel {
    pub fn new(waypoints: Vec<Position>, arrival_radius_m: f64, cyclic: bool) -> Self {
        Self {
            waypoints,
            arrival_radius_m: arrival_radius_m.max(0.0),
            cyclic,
            ..Self::default()
        }
    }

    /// Index of the waypoint being steered for
    pub fn next_waypoint(&self) -> usize {
        self.next
    }

    /// True once the last waypoint of a non-cyclic route has been reached
    pub fn is_holding(&self) -> bool {
        self.holding
    }
}

impl MovementModel {
    /// Advance `current` by `elapsed_s` seconds.
    ///
    /// Rate of turn is derived from the signed course change over the elapsed time. A zero or
    /// negative elapsed time leaves the state unchanged.
    pub fn advance<R: Rng + ?Sized>(&mut self, current: &Kinematics, elapsed_s: f64, rng: &mut R) -> Kinematics {
        if !(elapsed_s.is_finite() && elapsed_s > 0.0) {
            return *current;
        }

        let mut next = match self {
            MovementModel::Linear(model) => model.advance(current, elapsed_s, rng),
            MovementModel::Circular(model) => model.advance(current, elapsed_s),
            MovementModel::RandomWalk(model) => model.advance(current, elapsed_s, rng),
            MovementModel::Waypoint(model) => model.advance(current, elapsed_s),
        };

        next.course_deg = normalize_course(next.course_deg);
        next.heading_deg = normalize_course(next.heading_deg);
        next.speed_knots = next.speed_knots.max(0.0);
        next.rate_of_turn = course_change(current.course_deg, next.course_deg) / (elapsed_s / 60.0);
        next
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.gen_range(-bound..=bound)
    } else {
        0.0
    }
}

/// Gaussian noise truncated to +/- `bound`
fn noise<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    if bound <= 0.0 {
        return 0.0;
    }
    Normal::new(0.0, bound / 3.0)
        .map(|normal| normal.sample(rng).clamp(-bound, bound))
        .unwrap_or(0.0)
}

fn travel(position: Position, course_deg: f64, speed_knots: f64, elapsed_s: f64) -> Position {
    destination(position, course_deg, speed_knots * KNOTS_TO_MPS * elapsed_s)
}

impl LinearModel {
    fn advance<R: Rng + ?Sized>(&mut self, current: &Kinematics, elapsed_s: f64, rng: &mut R) -> Kinematics {
        let track = self.track.get_or_insert(Track {
            position: current.position,
            speed_knots: current.speed_knots,
            course_deg: current.course_deg,
        });
        track.position = travel(track.position, track.course_deg, track.speed_knots, elapsed_s);

        let course = track.course_deg + jitter(rng, self.course_variation);
        let position = Position::new(
            track.position.latitude() + noise(rng, self.position_noise),
            track.position.longitude() + noise(rng, self.position_noise),
        );
        Kinematics {
            position,
            speed_knots: track.speed_knots + jitter(rng, self.speed_variation),
            course_deg: course,
            heading_deg: course,
            rate_of_turn: current.rate_of_turn,
        }
    }
}

impl CircularModel {
    fn advance(&mut self, current: &Kinematics, elapsed_s: f64) -> Kinematics {
        let omega_deg_s = self.turn_rate / 60.0;
        let speed_mps = current.speed_knots * KNOTS_TO_MPS;
        if omega_deg_s == 0.0 || !omega_deg_s.is_finite() || speed_mps <= 0.0 {
            let position = travel(current.position, current.course_deg, current.speed_knots, elapsed_s);
            return Kinematics { position, ..*current };
        }

        let side = omega_deg_s.signum();
        let circle = self.circle.get_or_insert_with(|| {
            let radius = speed_mps / omega_deg_s.abs().to_radians();
            let center = destination(current.position, current.course_deg + 90.0 * side, radius);
            Circle {
                center,
                // Measured rather than assumed so the start point is reproduced exactly
                radius_m: distance_m(center, current.position),
                start_bearing: initial_bearing(center, current.position),
                start_course: current.course_deg,
                elapsed_s: 0.0,
            }
        });
        circle.elapsed_s += elapsed_s;

        let turned = omega_deg_s * circle.elapsed_s;
        let bearing = circle.start_bearing + turned;
        let course = circle.start_course + turned;
        Kinematics {
            position: destination(circle.center, bearing, circle.radius_m),
            speed_knots: current.speed_knots,
            course_deg: course,
            heading_deg: course,
            rate_of_turn: current.rate_of_turn,
        }
    }
}

impl RandomWalkModel {
    fn advance<R: Rng + ?Sized>(&mut self, current: &Kinematics, elapsed_s: f64, rng: &mut R) -> Kinematics {
        let (low, high) = (self.min_speed.max(0.0), self.max_speed.max(self.min_speed.max(0.0)));
        let speed = (current.speed_knots + jitter(rng, self.speed_step)).clamp(low, high);
        let course = normalize_course(current.course_deg + jitter(rng, self.course_step));
        Kinematics {
            position: travel(current.position, course, speed, elapsed_s),
            speed_knots: speed,
            course_deg: course,
            heading_deg: course,
            rate_of_turn: current.rate_of_turn,
        }
    }
}

impl WaypointModel {
    fn advance(&mut self, current: &Kinematics, elapsed_s: f64) -> Kinematics {
        let cruise = *self.speed_knots.get_or_insert(current.speed_knots);
        if self.holding || self.waypoints.is_empty() {
            return Kinematics { speed_knots: 0.0, ..*current };
        }

        let mut position = current.position;
        let mut course = current.course_deg;
        let mut budget_m = cruise.max(0.0) * KNOTS_TO_MPS * elapsed_s;

        // Each leg may finish inside one update; leftover distance carries on to the next waypoint
        for _ in 0..=self.waypoints.len() {
            let target = self.waypoints[self.next];
            let remaining = distance_m(position, target);
            if remaining > self.arrival_radius_m {
                course = initial_bearing(position, target);
                if budget_m < remaining {
                    position = destination(position, course, budget_m);
                    break;
                }
                budget_m -= remaining;
                position = target;
            }

            tracing::debug!("Reached waypoint {} at {}", self.next, target);
            if self.next + 1 < self.waypoints.len() {
                self.next += 1;
            } else if self.cyclic {
                self.next = 0;
            } else {
                self.holding = true;
                return Kinematics {
                    position,
                    speed_knots: 0.0,
                    course_deg: course,
                    heading_deg: course,
                    rate_of_turn: current.rate_of_turn,
                };
            }
            if budget_m <= 0.0 {
                break;
            }
        }

        Kinematics {
            position,
            speed_knots: cruise,
            course_deg: course,
            heading_deg: course,
            rate_of_turn: current.rate_of_turn,
        }
    }
}
