use glam::Vec3;
use serde::Serialize;
use std::time::Duration;
use vista_common::{Axis, NodeId};
use vista_frame::FrameTime;
use vista_scene::SceneGraph;

/// How a node's rotation changes over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Motion {
    /// Rotation is `base + rate · elapsed`, in radians per second per axis.
    /// `base` is the node's rotation on the first step.
    Spin { rate: Vec3, base: Option<Vec3> },
    /// One-shot turn of `turn` radians about `axis` over `duration`, eased
    /// out. Advanced by the clamped tick delta and dropped once complete.
    Turn {
        axis: Axis,
        turn: f32,
        duration: Duration,
        progress: Duration,
        from: Option<f32>,
    },
}

impl Motion {
    pub fn spin(rate: Vec3) -> Self {
        Self::Spin { rate, base: None }
    }

    pub fn turn(axis: Axis, turn: f32, duration: Duration) -> Self {
        Self::Turn {
            axis,
            turn,
            duration,
            progress: Duration::ZERO,
            from: None,
        }
    }

    fn is_turn(&self) -> bool {
        matches!(self, Self::Turn { .. })
    }

    /// Write this tick's rotation into `rotation`. Returns false once a turn
    /// has finished.
    fn advance(&mut self, rotation: &mut Vec3, time: &FrameTime) -> bool {
        match self {
            Self::Spin { rate, base } => {
                let base = *base.get_or_insert(*rotation);
                *rotation = base + *rate * time.elapsed.as_secs_f32();
                true
            }
            Self::Turn {
                axis,
                turn,
                duration,
                progress,
                from,
            } => {
                let from = *from.get_or_insert(axis.get(*rotation));
                *progress += time.delta;
                let t = if duration.is_zero() {
                    1.0
                } else {
                    (progress.as_secs_f32() / duration.as_secs_f32()).min(1.0)
                };
                axis.set(rotation, from + *turn * ease_out(t));
                t < 1.0
            }
        }
    }
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Per-node transform animation, stepped once per tick between the binding
/// mutations and the camera update.
#[derive(Debug, Default)]
pub struct Animator {
    motions: Vec<(NodeId, Motion)>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continuous rotation of `node` driven by elapsed time.
    pub fn spin(&mut self, node: NodeId, rate: Vec3) {
        self.motions.retain(|(n, m)| !(*n == node && !m.is_turn()));
        self.motions.push((node, Motion::spin(rate)));
    }

    /// Queue a one-shot turn of `node`. A turn already running on the node
    /// is replaced and the new one starts from wherever the node is.
    pub fn turn(&mut self, node: NodeId, axis: Axis, turn: f32, duration: Duration) {
        self.motions.retain(|(n, m)| !(*n == node && m.is_turn()));
        self.motions.push((node, Motion::turn(axis, turn, duration)));
    }

    pub fn is_animating(&self, node: NodeId) -> bool {
        self.motions.iter().any(|(n, _)| *n == node)
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    pub fn clear(&mut self) {
        self.motions.clear();
    }

    /// Advance every motion by one tick. Motions on removed nodes and
    /// finished turns are dropped. Returns the number of nodes written.
    pub fn step(&mut self, scene: &mut SceneGraph, time: &FrameTime) -> usize {
        let mut written = 0;
        self.motions.retain_mut(|(node, motion)| {
            let Some(n) = scene.get_mut(*node) else {
                tracing::debug!(%node, "animation target removed");
                return false;
            };
            written += 1;
            motion.advance(&mut n.transform.rotation, time)
        });
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;
    use vista_scene::SceneNode;

    fn at(frame: u64, delta_ms: u64, elapsed_ms: u64) -> FrameTime {
        FrameTime {
            frame,
            delta: Duration::from_millis(delta_ms),
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn scene_with_node() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let node = scene.insert(root, SceneNode::new("spinner")).unwrap();
        (scene, node)
    }

    #[test]
    fn spin_follows_elapsed_time() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        animator.spin(node, Vec3::new(0.15, 0.1, 0.0));

        assert_eq!(animator.step(&mut scene, &at(0, 0, 0)), 1);
        assert_eq!(scene.get(node).unwrap().transform.rotation, Vec3::ZERO);

        animator.step(&mut scene, &at(1, 100, 2000));
        let r = scene.get(node).unwrap().transform.rotation;
        assert!((r - Vec3::new(0.3, 0.2, 0.0)).length() < 1e-5, "{r}");
        assert!(animator.is_animating(node));
    }

    #[test]
    fn turn_completes_and_is_dropped() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        animator.turn(node, Axis::Y, TAU, Duration::from_secs(1));

        for frame in 0..9 {
            animator.step(&mut scene, &at(frame, 100, frame * 100));
        }
        let partway = scene.get(node).unwrap().transform.rotation.y;
        assert!(partway > 0.0 && partway < TAU);
        assert!(animator.is_animating(node));

        animator.step(&mut scene, &at(9, 100, 900));
        assert!((scene.get(node).unwrap().transform.rotation.y - TAU).abs() < 1e-5);
        assert!(animator.is_empty());
    }

    #[test]
    fn second_turn_restarts_from_current_rotation() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        animator.turn(node, Axis::Y, TAU, Duration::from_secs(1));
        animator.step(&mut scene, &at(0, 500, 0));
        let midway = scene.get(node).unwrap().transform.rotation.y;

        animator.turn(node, Axis::Y, TAU, Duration::from_secs(1));
        assert_eq!(animator.len(), 1);
        for frame in 1..12 {
            animator.step(&mut scene, &at(frame, 100, frame * 100));
        }
        let end = scene.get(node).unwrap().transform.rotation.y;
        assert!((end - (midway + TAU)).abs() < 1e-4);
    }

    #[test]
    fn removed_node_drops_its_motion() {
        let (mut scene, node) = scene_with_node();
        let mut animator = Animator::new();
        animator.spin(node, Vec3::Y);
        scene.remove(node).unwrap();
        assert_eq!(animator.step(&mut scene, &at(0, 16, 16)), 0);
        assert!(animator.is_empty());
    }
}
