#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
use rand::Rng;

/// Pairs closer than this are skipped by separation so the inverse-distance
/// weight stays finite.
pub const MIN_SEPARATION_DISTANCE: f32 = 1.0e-6;

mod math {
    #[cfg(feature = "std")]
    pub fn sqrt(value: f32) -> f32 {
        value.sqrt()
    }

    #[cfg(not(feature = "std"))]
    pub fn sqrt(value: f32) -> f32 {
        libm::sqrtf(value)
    }

    #[cfg(feature = "std")]
    pub fn sin_cos(value: f32) -> (f32, f32) {
        value.sin_cos()
    }

    #[cfg(not(feature = "std"))]
    pub fn sin_cos(value: f32) -> (f32, f32) {
        (libm::sinf(value), libm::cosf(value))
    }

    #[cfg(feature = "std")]
    pub fn atan2(y: f32, x: f32) -> f32 {
        y.atan2(x)
    }

    #[cfg(not(feature = "std"))]
    pub fn atan2(y: f32, x: f32) -> f32 {
        libm::atan2f(y, x)
    }

    // The phase grows without bound, so the wander angle is evaluated in f64.
    #[cfg(feature = "std")]
    pub fn sin64(value: f64) -> f64 {
        value.sin()
    }

    #[cfg(not(feature = "std"))]
    pub fn sin64(value: f64) -> f64 {
        libm::sin(value)
    }

    #[cfg(feature = "std")]
    pub fn cos64(value: f64) -> f64 {
        value.cos()
    }

    #[cfg(not(feature = "std"))]
    pub fn cos64(value: f64) -> f64 {
        libm::cos(value)
    }
}

/// A 3D vector used for positions and displacements (Y is up)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn magnitude(&self) -> f32 {
        math::sqrt(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
                z: self.z / mag,
            }
        } else {
            Self::zero()
        }
    }

    pub fn distance(&self, other: &Vector3D) -> f32 {
        (*self - *other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl core::ops::Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl core::ops::Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl core::ops::Mul<f32> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector3D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

/// Yaw-only facing about the vertical axis.
///
/// Uses a left-handed, Y-up frame: a yaw of zero faces +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub yaw: f32,
}

impl Orientation {
    pub fn from_yaw(yaw: f32) -> Self {
        Self { yaw }
    }

    /// Facing derived from a displacement, or `None` when it has no
    /// horizontal component and the heading is undefined.
    pub fn facing(velocity: Vector3D) -> Option<Self> {
        if velocity.x == 0.0 && velocity.z == 0.0 {
            return None;
        }
        Some(Self {
            yaw: -math::atan2(velocity.z, velocity.x),
        })
    }

    /// The local +Z axis rotated by this orientation.
    pub fn forward(&self) -> Vector3D {
        let (sin, cos) = math::sin_cos(self.yaw);
        Vector3D::new(sin, 0.0, cos)
    }

    /// Rotation quaternion as `[x, y, z, w]`.
    pub fn quaternion(&self) -> [f32; 4] {
        let (sin, cos) = math::sin_cos(self.yaw * 0.5);
        [0.0, sin, 0.0, cos]
    }
}

/// A single flocking agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: Vector3D,
    pub orientation: Orientation,
}

impl Agent {
    pub fn new(position: Vector3D) -> Self {
        Self {
            position,
            orientation: Orientation::default(),
        }
    }

    #[cfg(feature = "std")]
    pub fn random<R: Rng>(bounds: &SpawnBounds, rng: &mut R) -> Self {
        Self::new(bounds.sample(rng))
    }
}

/// Axis-aligned box used for initial placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnBounds {
    pub min: Vector3D,
    pub max: Vector3D,
}

impl SpawnBounds {
    pub fn new(min: Vector3D, max: Vector3D) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: &Vector3D) -> bool {
        axis_contains(point.x, self.min.x, self.max.x)
            && axis_contains(point.y, self.min.y, self.max.y)
            && axis_contains(point.z, self.min.z, self.max.z)
    }

    /// Draws one point, one uniform sample per axis in x, y, z order.
    #[cfg(feature = "std")]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vector3D {
        let x = sample_axis(rng, self.min.x, self.max.x);
        let y = sample_axis(rng, self.min.y, self.max.y);
        let z = sample_axis(rng, self.min.z, self.max.z);
        Vector3D::new(x, y, z)
    }
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            min: Vector3D::new(-1.0, -5.0, -5.0),
            max: Vector3D::new(14.0, 0.0, 10.0),
        }
    }
}

fn axis_contains(value: f32, min: f32, max: f32) -> bool {
    if max > min {
        value >= min && value < max
    } else {
        value == min
    }
}

#[cfg(feature = "std")]
fn sample_axis<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    // gen_range panics on an empty range
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Per-axis constants of the baseline wander motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub amplitude: Vector3D,
    /// Phase offset per agent index, per axis.
    pub frequency: Vector3D,
}

impl Oscillation {
    pub fn still() -> Self {
        Self {
            amplitude: Vector3D::zero(),
            frequency: Vector3D::zero(),
        }
    }
}

impl Default for Oscillation {
    fn default() -> Self {
        Self {
            amplitude: Vector3D::new(0.3, 0.05, 0.3),
            frequency: Vector3D::new(0.05, 0.5, 0.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRadii {
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
}

impl Default for NeighborRadii {
    fn default() -> Self {
        Self {
            alignment: 1.0,
            cohesion: 2.0,
            separation: 2.0,
        }
    }
}

/// Blend factors for the steering terms.
///
/// An alignment weight of zero keeps the alignment vector computed but unapplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            alignment: 0.0,
            cohesion: 0.05,
            separation: 0.02,
        }
    }
}

/// Configuration for the flock simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockConfig {
    pub count: usize,
    pub spawn_bounds: SpawnBounds,
    pub oscillation: Oscillation,
    pub neighbor_radii: NeighborRadii,
    pub weights: Weights,
    /// Phase added at the start of every step.
    pub phase_step: f64,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            count: 100,
            spawn_bounds: SpawnBounds::default(),
            oscillation: Oscillation::default(),
            neighbor_radii: NeighborRadii::default(),
            weights: Weights::default(),
            phase_step: 0.005,
        }
    }
}

/// Steering terms evaluated against the agents of one flock
pub mod behavior {
    use super::*;

    /// Wander displacement of agent `index` at phase `phase`.
    pub fn wander(oscillation: &Oscillation, phase: f64, index: usize) -> Vector3D {
        let i = index as f64;
        let amp = oscillation.amplitude;
        let freq = oscillation.frequency;
        let pi = core::f64::consts::PI;

        Vector3D::new(
            amp.x * math::sin64(pi * (phase + i * freq.x as f64)) as f32,
            amp.y * math::cos64(pi * (phase + i * freq.y as f64)) as f32,
            amp.z * math::sin64(pi * (phase + i * freq.z as f64)) as f32,
        )
    }

    /// Average forward direction of the agents within `radius` of agent `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for `agents`.
    pub fn alignment(index: usize, agents: &[Agent], radius: f32) -> Vector3D {
        let position = agents[index].position;
        let mut sum = Vector3D::zero();
        let mut count = 0;

        for (j, other) in agents.iter().enumerate() {
            if j != index && position.distance(&other.position) < radius {
                sum += other.orientation.forward();
                count += 1;
            }
        }

        if count > 0 {
            sum = sum / count as f32;
        }

        sum
    }

    /// Centroid of the agents within `radius` of agent `index`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for `agents`.
    pub fn cohesion_center(index: usize, agents: &[Agent], radius: f32) -> Option<Vector3D> {
        let position = agents[index].position;
        let mut sum = Vector3D::zero();
        let mut count = 0;

        for (j, other) in agents.iter().enumerate() {
            if j != index && position.distance(&other.position) < radius {
                sum += other.position;
                count += 1;
            }
        }

        if count > 0 {
            Some(sum / count as f32)
        } else {
            None
        }
    }

    /// Sum of unit repulsions scaled by inverse distance (not averaged).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for `agents`.
    pub fn separation(index: usize, agents: &[Agent], radius: f32) -> Vector3D {
        let position = agents[index].position;
        let mut steering = Vector3D::zero();

        for (j, other) in agents.iter().enumerate() {
            if j == index {
                continue;
            }
            let distance = position.distance(&other.position);
            if distance > MIN_SEPARATION_DISTANCE && distance < radius {
                let diff = (position - other.position).normalize();
                steering += diff / distance;
            }
        }

        steering
    }
}

/// Advances `agents` in place by one step at phase `phase`.
///
/// Agents are processed in index order and each one reads the already
/// updated positions of the agents before it.
pub fn step_agents(agents: &mut [Agent], config: &FlockConfig, phase: f64) {
    let radii = config.neighbor_radii;
    let weights = config.weights;

    for i in 0..agents.len() {
        let origin = agents[i].position;
        agents[i].position += behavior::wander(&config.oscillation, phase, i);

        let velocity = agents[i].position - origin;
        if let Some(orientation) = Orientation::facing(velocity) {
            agents[i].orientation = orientation;
        }

        let alignment = behavior::alignment(i, agents, radii.alignment);
        if weights.alignment != 0.0 {
            agents[i].position += alignment * weights.alignment;
        }

        if let Some(center) = behavior::cohesion_center(i, agents, radii.cohesion) {
            let position = agents[i].position;
            agents[i].position = position + (center - position) * weights.cohesion;
        }

        let separation = behavior::separation(i, agents, radii.separation);
        agents[i].position += separation * weights.separation;
    }
}

/// A capacity-bounded flock for embedded (no_std) environments
pub struct FixedFlock<const N: usize> {
    agents: heapless::Vec<Agent, N>,
    config: FlockConfig,
    phase: f64,
}

impl<const N: usize> FixedFlock<N> {
    /// Places one agent per position. Returns the first agent that does not fit.
    pub fn from_positions<I>(config: FlockConfig, positions: I) -> Result<Self, Agent>
    where
        I: IntoIterator<Item = Vector3D>,
    {
        let mut agents = heapless::Vec::new();
        for position in positions {
            agents.push(Agent::new(position))?;
        }

        let config = FlockConfig {
            count: agents.len(),
            ..config
        };
        Ok(Self {
            agents,
            config,
            phase: 0.0,
        })
    }

    #[cfg(feature = "std")]
    pub fn with_rng<R: Rng>(config: FlockConfig, rng: &mut R) -> Result<Self, Agent> {
        let mut agents = heapless::Vec::new();
        for _ in 0..config.count {
            agents.push(Agent::random(&config.spawn_bounds, rng))?;
        }

        Ok(Self {
            agents,
            config,
            phase: 0.0,
        })
    }

    pub fn step(&mut self) {
        self.phase += self.config.phase_step;
        step_agents(&mut self.agents, &self.config, self.phase);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }
}

/// A collection of agents for std environments
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct Flock {
    agents: Vec<Agent>,
    config: FlockConfig,
    phase: f64,
}

#[cfg(feature = "std")]
impl Flock {
    /// Spawns `config.count` agents from an entropy-seeded generator.
    pub fn new(config: FlockConfig) -> Self {
        use rand::SeedableRng;
        Self::with_rng(config, &mut rand::rngs::StdRng::from_entropy())
    }

    /// Deterministic spawn: equal seeds give equal flocks.
    pub fn with_seed(config: FlockConfig, seed: u64) -> Self {
        use rand::SeedableRng;
        Self::with_rng(config, &mut rand::rngs::StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng>(config: FlockConfig, rng: &mut R) -> Self {
        let agents = (0..config.count)
            .map(|_| Agent::random(&config.spawn_bounds, rng))
            .collect();

        Self {
            agents,
            config,
            phase: 0.0,
        }
    }

    /// Places one agent per position; `count` follows the number of positions.
    pub fn from_positions<I>(config: FlockConfig, positions: I) -> Self
    where
        I: IntoIterator<Item = Vector3D>,
    {
        let agents: Vec<Agent> = positions.into_iter().map(Agent::new).collect();
        let config = FlockConfig {
            count: agents.len(),
            ..config
        };

        Self {
            agents,
            config,
            phase: 0.0,
        }
    }

    pub fn step(&mut self) {
        self.phase += self.config.phase_step;
        step_agents(&mut self.agents, &self.config, self.phase);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }
}
