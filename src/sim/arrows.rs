//! Transient arrow feedback
//!
//! One short-lived arrow per accepted input. Arrows run their own clock and
//! finish their lifecycle even if the round that spawned them has ended.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::catalog::Direction;

pub type ArrowId = u32;

/// Lifecycle phase of an arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowPhase {
    Spawned,
    Moving,
    Fading,
    Removed,
}

/// Colour hint for the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowTone {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowEvent {
    pub id: ArrowId,
    pub direction: Direction,
    pub tone: ArrowTone,
    pub offset: Vec2,
    pub opacity: f32,
    pub phase: ArrowPhase,
    /// Seconds since spawn
    pub age: f32,
}

/// Timings shared by every arrow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowTiming {
    pub move_secs: f32,
    pub fade_secs: f32,
    pub travel: f32,
}

impl ArrowTiming {
    /// Total lifetime from spawn to removal
    pub fn lifetime(&self) -> f32 {
        self.move_secs + self.fade_secs
    }
}

impl Default for ArrowTiming {
    fn default() -> Self {
        Self {
            move_secs: 0.2,
            fade_secs: 0.2,
            travel: 40.0,
        }
    }
}

impl ArrowEvent {
    fn step(&mut self, dt: f32, timing: &ArrowTiming) {
        if self.phase == ArrowPhase::Removed {
            return;
        }
        if self.phase == ArrowPhase::Spawned {
            // Spawn is instantaneous; the first step starts movement
            self.phase = ArrowPhase::Moving;
        }
        self.age += dt.max(0.0);

        let dir = self.direction.screen_vector();
        if self.age < timing.move_secs {
            let t = self.age / timing.move_secs;
            self.offset = dir * timing.travel * t;
            self.opacity = 1.0;
        } else if self.age < timing.lifetime() {
            self.phase = ArrowPhase::Fading;
            self.offset = dir * timing.travel;
            self.opacity = 1.0 - (self.age - timing.move_secs) / timing.fade_secs;
        } else {
            self.phase = ArrowPhase::Removed;
            self.offset = dir * timing.travel;
            self.opacity = 0.0;
        }
    }
}

/// Bounded set of live arrows, oldest first
#[derive(Debug, Clone)]
pub struct ArrowQueue {
    arrows: VecDeque<ArrowEvent>,
    timing: ArrowTiming,
    capacity: usize,
    next_id: ArrowId,
}

impl ArrowQueue {
    pub fn new(timing: ArrowTiming, capacity: usize) -> Self {
        Self {
            arrows: VecDeque::with_capacity(capacity),
            timing,
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Add an arrow. Drops the oldest when the queue is full.
    pub fn spawn(&mut self, direction: Direction, tone: ArrowTone) -> ArrowId {
        if self.arrows.len() >= self.capacity {
            if let Some(dropped) = self.arrows.pop_front() {
                log::debug!("Arrow queue full, dropping arrow {}", dropped.id);
            }
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.arrows.push_back(ArrowEvent {
            id,
            direction,
            tone,
            offset: Vec2::ZERO,
            opacity: 1.0,
            phase: ArrowPhase::Spawned,
            age: 0.0,
        });
        id
    }

    /// Step every arrow and drop those that finished.
    ///
    /// Returns the ids removed this step.
    pub fn advance(&mut self, dt: f32) -> Vec<ArrowId> {
        let timing = self.timing;
        for arrow in &mut self.arrows {
            arrow.step(dt, &timing);
        }
        let mut removed = Vec::new();
        self.arrows.retain(|a| {
            if a.phase == ArrowPhase::Removed {
                removed.push(a.id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn remove(&mut self, id: ArrowId) -> bool {
        let before = self.arrows.len();
        self.arrows.retain(|a| a.id != id);
        self.arrows.len() != before
    }

    pub fn clear(&mut self) {
        self.arrows.clear();
    }

    /// Change how far arrows travel (zero under reduced motion)
    pub fn set_travel(&mut self, travel: f32) {
        self.timing.travel = travel.max(0.0);
    }

    pub fn timing(&self) -> &ArrowTiming {
        &self.timing
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArrowEvent> {
        self.arrows.iter()
    }

    pub fn len(&self) -> usize {
        self.arrows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty()
    }
}
