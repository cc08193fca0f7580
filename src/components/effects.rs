//! Effect components: float, shake and the fade/slide transition.
//!
//! Each running effect is a component on its target carrying an
//! [`EffectState`]. There is at most one component of each kind per entity,
//! so starting a new float or shake on the same target replaces the previous
//! one. Stopping an effect removes the component synchronously; the update
//! systems only ever write through live components, which is what makes a
//! stop immediate.
//!
//! Effects record the frame they were started on and only write from the
//! following frame onward.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use smallvec::SmallVec;

/// Effect families understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Float,
    Shake,
    FadeSlide,
}

/// Handle returned when an effect starts.
///
/// The token ties the handle to one specific run: stopping with a stale
/// handle does not affect a newer effect of the same kind on the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    pub target: Entity,
    pub kind: EffectKind,
    pub token: u64,
}

/// Bookkeeping shared by every effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectState {
    pub active: bool,
    /// World time (seconds) when the effect was started.
    pub start_time: f32,
    /// Frame number on which the effect was started. No writes happen on it.
    pub start_frame: u64,
    pub token: u64,
}

impl EffectState {
    pub fn new(start_time: f32, start_frame: u64, token: u64) -> Self {
        EffectState {
            active: true,
            start_time,
            start_frame,
            token,
        }
    }

    /// Whether the effect may write during `frame`.
    pub fn runs_on(&self, frame: u64) -> bool {
        self.active && frame > self.start_frame
    }

    pub fn elapsed(&self, now: f32) -> f32 {
        (now - self.start_time).max(0.0)
    }
}

/// Position, rotation and scale captured when an effect starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePose {
    pub pos: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

/// Float parameters: amplitude in stage units and a frequency multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatParams {
    pub range: f32,
    pub speed: f32,
}

impl Default for FloatParams {
    fn default() -> Self {
        FloatParams {
            range: 15.0,
            speed: 1.2,
        }
    }
}

/// Indefinite oscillation around `base`.
#[derive(Component, Debug, Clone)]
pub struct FloatEffect {
    pub state: EffectState,
    pub params: FloatParams,
    pub base: Vec2,
}

/// Shake parameters. `intensity` is the jitter amplitude at full strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeParams {
    pub duration: f32,
    pub intensity: f32,
}

impl Default for ShakeParams {
    fn default() -> Self {
        ShakeParams {
            duration: 1.0,
            intensity: 10.0,
        }
    }
}

/// Fixed-duration random jitter that ends exactly on `base`.
#[derive(Component, Debug, Clone)]
pub struct ShakeEffect {
    pub state: EffectState,
    pub params: ShakeParams,
    pub base: BasePose,
    /// Signal carried by the completion event.
    pub signal: String,
}

/// Parameters for the background swap transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeSlideParams {
    pub duration: f32,
    /// Entities whose opacity goes from 0 to 1.
    pub fade_in: SmallVec<[Entity; 2]>,
    /// Vertical slide of the target, start and end `y`.
    pub slide_from: f32,
    pub slide_to: f32,
    /// Entities despawned once the transition completes.
    pub retire: Vec<Entity>,
}

/// Simultaneous opacity fade-in and vertical slide, cubic ease-out.
#[derive(Component, Debug, Clone)]
pub struct FadeSlideTransition {
    pub state: EffectState,
    pub params: FadeSlideParams,
}
