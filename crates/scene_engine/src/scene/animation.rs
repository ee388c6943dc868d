//! Keyframe sampling and application to node transforms

use log::trace;

use crate::foundation::math::{quat_from_xyzw, utils, LocalTransform, Quat, Vec3};
use crate::scene::document::{Channel, Driver, Interpolation};
use crate::scene::scene_tree::SceneTree;

/// Keyframe spans shorter than this are treated as a jump to the left key
const MIN_KEY_SPAN: f32 = 1.0e-6;

/// A sampled channel value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    /// Local translation
    Translation(Vec3),
    /// Local rotation
    Rotation(Quat),
    /// Local scale
    Scale(Vec3),
}

impl ChannelValue {
    /// Write this value into the matching field of a local transform
    pub fn apply(self, local: &mut LocalTransform) {
        match self {
            ChannelValue::Translation(t) => local.translation = t,
            ChannelValue::Rotation(r) => local.rotation = r,
            ChannelValue::Scale(s) => local.scale = s,
        }
    }
}

fn key_value(driver: &Driver, key: usize) -> ChannelValue {
    let arity = driver.channel.arity();
    let v = &driver.values[key * arity..(key + 1) * arity];
    match driver.channel {
        Channel::Translation => ChannelValue::Translation(Vec3::new(v[0], v[1], v[2])),
        Channel::Scale => ChannelValue::Scale(Vec3::new(v[0], v[1], v[2])),
        Channel::Rotation => ChannelValue::Rotation(quat_from_xyzw(v[0], v[1], v[2], v[3])),
    }
}

/// Sample a driver at `time`, clamping outside the keyframe range
///
/// Returns `None` for a driver without keyframes.
pub fn sample(driver: &Driver, time: f32) -> Option<ChannelValue> {
    let times = &driver.times;
    let last = times.len().checked_sub(1)?;

    // NaN compares false against every key, so it is pinned to the first one
    if time.is_nan() || time < times[0] {
        return Some(key_value(driver, 0));
    }
    if time >= times[last] {
        return Some(key_value(driver, last));
    }

    // First key strictly later than `time`. Key times are finite and sorted,
    // so times[0] <= time < times[last] keeps it in 1..=last
    let right = times.partition_point(|&t| t <= time);
    let left = right - 1;

    let span = times[right] - times[left];
    let ratio = if span > MIN_KEY_SPAN { (time - times[left]) / span } else { 0.0 };
    if ratio <= 0.0 {
        return Some(key_value(driver, left));
    }

    let value = match (key_value(driver, left), key_value(driver, right)) {
        (ChannelValue::Rotation(a), ChannelValue::Rotation(b)) => ChannelValue::Rotation(utils::slerp(&a, &b, ratio)),
        (ChannelValue::Translation(a), ChannelValue::Translation(b)) if driver.interpolation == Interpolation::Linear => {
            ChannelValue::Translation(utils::mix(&a, &b, ratio))
        }
        (ChannelValue::Scale(a), ChannelValue::Scale(b)) if driver.interpolation == Interpolation::Linear => {
            ChannelValue::Scale(utils::mix(&a, &b, ratio))
        }
        // Non-linear translation and scale hold the left key
        (left_value, _) => left_value,
    };
    Some(value)
}

impl SceneTree {
    /// Evaluate every driver at `time` and write the results into node transforms
    ///
    /// Nodes whose sampled value equals their current value are left clean.
    pub fn update_animation(&mut self, time: f32) {
        let mut changed = 0usize;
        for i in 0..self.document().drivers.len() {
            let driver = &self.document().drivers[i];
            let Some(value) = sample(driver, time) else {
                continue;
            };
            let node = driver.node;

            let mut local = *self.local_transform(node);
            value.apply(&mut local);
            if local != *self.local_transform(node) {
                self.set_local_transform(node, local);
                changed += 1;
            }
        }
        trace!("Animation at t={:.3}: {} channel writes", time, changed);
    }
}
