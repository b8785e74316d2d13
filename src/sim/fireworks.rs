//! Fireworks particle bursts
//!
//! Each bounce spawns one burst from the bottom of the fireworks layer. Bursts
//! are kept in spawn order and capped at [`MAX_BURSTS`]; the oldest burst is
//! evicted when a new one would exceed the cap.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::consts::MAX_BURSTS;
use crate::renderer::{BlendMode, DrawSurface};

/// Frame time the particle velocities are expressed against (60 Hz)
pub const REFERENCE_STEP_MS: f32 = 16.7;
/// Downward acceleration added to each particle every frame
pub const PARTICLE_GRAVITY: f32 = 0.06;

/// Burst palette (#ffd166, #ef476f, #06d6a0, #118ab2, #f97316, #a78bfa)
pub const PALETTE: [[f32; 4]; 6] = [
    [1.0, 0.820, 0.400, 1.0],
    [0.937, 0.278, 0.435, 1.0],
    [0.024, 0.839, 0.627, 1.0],
    [0.067, 0.541, 0.698, 1.0],
    [0.976, 0.451, 0.086, 1.0],
    [0.655, 0.545, 0.980, 1.0],
];

/// A single spark
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Time alive (ms)
    pub age: f32,
    /// Lifetime (ms); removed once `age > life`
    pub life: f32,
    pub color: [f32; 4],
    /// Radius in CSS pixels
    pub size: f32,
}

impl Particle {
    /// Launch a spark from `origin`. Angles cover a half turn and the vertical
    /// component always points up with at least 1.2 units of lift.
    pub fn launch<R: Rng + ?Sized>(origin: Vec2, rng: &mut R) -> Self {
        let angle = rng.random::<f32>() * PI - PI / 2.0;
        let speed = 1.0 + rng.random::<f32>() * 2.4;
        Self {
            pos: origin,
            vel: Vec2::new(
                angle.cos() * speed,
                -(angle.sin() * speed).abs() - 1.2,
            ),
            age: 0.0,
            life: 600.0 + rng.random::<f32>() * 500.0,
            color: PALETTE[rng.random_range(0..PALETTE.len())],
            size: 3.0 + rng.random::<f32>() * 4.0,
        }
    }

    /// Age by `dt` ms and integrate. Returns false once expired.
    fn step(&mut self, dt: f32) -> bool {
        self.age += dt;
        if self.age > self.life {
            return false;
        }
        self.vel.y += PARTICLE_GRAVITY;
        self.pos += self.vel * (dt / REFERENCE_STEP_MS);
        true
    }
}

/// One explosion: sparks sharing an origin and spawn time
#[derive(Debug, Clone)]
pub struct Burst {
    pub id: u32,
    pub particles: Vec<Particle>,
}

impl Burst {
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Bounded, spawn-ordered set of bursts
#[derive(Debug, Clone)]
pub struct Fireworks {
    bursts: VecDeque<Burst>,
    next_id: u32,
}

impl Default for Fireworks {
    fn default() -> Self {
        Self::new()
    }
}

impl Fireworks {
    pub fn new() -> Self {
        Self {
            bursts: VecDeque::with_capacity(MAX_BURSTS + 1),
            next_id: 1,
        }
    }

    /// Spawn a burst of 26-35 sparks at `origin`. Returns the burst id.
    pub fn spawn<R: Rng + ?Sized>(&mut self, origin: Vec2, rng: &mut R) -> u32 {
        let count = 26 + (rng.random::<f32>() * 10.0) as usize;
        let particles = (0..count)
            .map(|_| Particle::launch(origin, rng))
            .collect();

        let id = self.next_id;
        self.next_id += 1;
        self.bursts.push_back(Burst { id, particles });

        if self.bursts.len() > MAX_BURSTS {
            if let Some(evicted) = self.bursts.pop_front() {
                log::debug!(
                    "Evicted burst {} ({} sparks left)",
                    evicted.id,
                    evicted.particles.len()
                );
            }
        }

        log::debug!("Spawned burst {} with {} sparks", id, count);
        id
    }

    /// Age, move and cull every spark, then draw the survivors additively.
    ///
    /// A spark is removed on the same frame its age passes its life, and a
    /// burst is removed once its last spark is gone.
    pub fn advance<D: DrawSurface + ?Sized>(&mut self, dt: f32, surface: &mut D) {
        surface.clear();
        surface.set_blend(BlendMode::Additive);

        for burst in self.bursts.iter_mut() {
            burst.particles.retain_mut(|p| {
                let alive = p.step(dt);
                if alive {
                    surface.fill_circle(p.pos, p.size, p.color);
                }
                alive
            });
        }
        self.bursts.retain(|b| !b.is_empty());

        surface.set_blend(BlendMode::Alpha);
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn particle_count(&self) -> usize {
        self.bursts.iter().map(|b| b.particles.len()).sum()
    }

    pub fn bursts(&self) -> impl Iterator<Item = &Burst> {
        self.bursts.iter()
    }

    pub fn clear(&mut self) {
        self.bursts.clear();
    }
}
