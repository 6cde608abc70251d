use crate::field::FieldRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(pub u32);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("binding {0} not found")]
    UnknownBinding(BindingId),
    #[error("invalid range [{min}, {max}] step {step}")]
    InvalidRange { min: f64, max: f64, step: f64 },
    #[error("input value {0} is not a number")]
    InvalidValue(f64),
}

/// A value change staged by a control, applied by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Intermediate value while the user is still interacting.
    Set {
        binding: BindingId,
        field: FieldRef,
        value: f64,
    },
    /// Interaction ended at `value`.
    Commit {
        binding: BindingId,
        field: FieldRef,
        value: f64,
    },
}

impl Mutation {
    pub fn binding(&self) -> BindingId {
        match self {
            Self::Set { binding, .. } | Self::Commit { binding, .. } => *binding,
        }
    }
}

/// Whatever owns the fields that bindings point at.
pub trait BindingTarget {
    type Error: fmt::Display;

    /// Current value of a field, if it exists.
    fn read_field(&self, field: &FieldRef) -> Option<f64>;

    /// Apply an intermediate value. Must stay cheap.
    fn set_field(&mut self, field: &FieldRef, value: f64) -> Result<(), Self::Error>;

    /// Apply the final value of an interaction. May rebuild resources; on
    /// error the previous state must remain in effect.
    fn commit_field(&mut self, field: &FieldRef, value: f64) -> Result<(), Self::Error>;
}

/// Outcome of draining the mutation queue once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub sets: usize,
    pub commits: usize,
    pub failures: Vec<(BindingId, String)>,
}

type Hook = Box<dyn FnMut(f64)>;

/// A live link between a control and one field.
pub struct TunableBinding {
    section: String,
    field: FieldRef,
    min: f64,
    max: f64,
    step: f64,
    value: f64,
    on_change: Option<Hook>,
    on_commit: Option<Hook>,
    last_failure: Option<String>,
}

impl fmt::Debug for TunableBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunableBinding")
            .field("section", &self.section)
            .field("field", &self.field)
            .field("range", &(self.min..=self.max))
            .field("step", &self.step)
            .field("value", &self.value)
            .field("last_failure", &self.last_failure)
            .finish_non_exhaustive()
    }
}

impl TunableBinding {
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn field(&self) -> FieldRef {
        self.field
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Last applied value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Why the most recent commit failed, cleared by the next successful one.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }
}

/// Clamp `raw` into `[min, max]` and snap it to the nearest multiple of
/// `step` that still lies in the range. If no multiple fits, the clamped
/// value is returned.
pub fn quantize(raw: f64, min: f64, max: f64, step: f64) -> f64 {
    let clamped = raw.clamp(min, max);
    let mut snapped = (clamped / step).round() * step;
    if snapped > max {
        snapped -= step;
    } else if snapped < min {
        snapped += step;
    }
    if snapped < min || snapped > max {
        return clamped;
    }
    snapped
}

/// Every live binding plus the queue of mutations they have staged.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: BTreeMap<BindingId, TunableBinding>,
    queue: Vec<Mutation>,
    next_id: u32,
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("bindings", &self.bindings)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding under a panel `section`. Its value starts at `min`
    /// until [`seed`](Self::seed) reports the field's current value.
    pub fn bind(
        &mut self,
        section: impl Into<String>,
        field: FieldRef,
        min: f64,
        max: f64,
        step: f64,
    ) -> Result<BindingId, BindingError> {
        let valid = min.is_finite() && max.is_finite() && step.is_finite();
        if !valid || min > max || step <= 0.0 {
            return Err(BindingError::InvalidRange { min, max, step });
        }
        let id = BindingId(self.next_id);
        self.next_id += 1;
        let section = section.into();
        tracing::debug!(%id, %field, section, min, max, step, "binding registered");
        self.bindings.insert(
            id,
            TunableBinding {
                section,
                field,
                min,
                max,
                step,
                value: min,
                on_change: None,
                on_commit: None,
                last_failure: None,
            },
        );
        Ok(id)
    }

    /// Register a boolean field as `[0, 1]` step 1.
    pub fn bind_toggle(
        &mut self,
        section: impl Into<String>,
        field: FieldRef,
    ) -> Result<BindingId, BindingError> {
        self.bind(section, field, 0.0, 1.0, 1.0)
    }

    fn binding_mut(&mut self, id: BindingId) -> Result<&mut TunableBinding, BindingError> {
        self.bindings
            .get_mut(&id)
            .ok_or(BindingError::UnknownBinding(id))
    }

    pub fn get(&self, id: BindingId) -> Option<&TunableBinding> {
        self.bindings.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BindingId, &TunableBinding)> {
        self.bindings.iter().map(|(id, b)| (*id, b))
    }

    /// Bindings of one section in registration order.
    pub fn section(&self, name: &str) -> impl Iterator<Item = (BindingId, &TunableBinding)> {
        self.iter().filter(move |(_, b)| b.section == name)
    }

    /// Distinct section names in first-registration order.
    pub fn sections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for b in self.bindings.values() {
            if !names.contains(&b.section.as_str()) {
                names.push(&b.section);
            }
        }
        names
    }

    pub fn on_change(
        &mut self,
        id: BindingId,
        hook: impl FnMut(f64) + 'static,
    ) -> Result<(), BindingError> {
        self.binding_mut(id)?.on_change = Some(Box::new(hook));
        Ok(())
    }

    pub fn on_commit(
        &mut self,
        id: BindingId,
        hook: impl FnMut(f64) + 'static,
    ) -> Result<(), BindingError> {
        self.binding_mut(id)?.on_commit = Some(Box::new(hook));
        Ok(())
    }

    /// Set the displayed value from the target without firing hooks or
    /// staging a mutation.
    pub fn seed(&mut self, id: BindingId, current: f64) -> Result<f64, BindingError> {
        let b = self.binding_mut(id)?;
        if current.is_finite() {
            b.value = quantize(current, b.min, b.max, b.step);
        }
        Ok(b.value)
    }

    /// Seed every binding from `target`.
    pub fn seed_all<T: BindingTarget + ?Sized>(&mut self, target: &T) {
        for b in self.bindings.values_mut() {
            if let Some(current) = target.read_field(&b.field).filter(|v| v.is_finite()) {
                b.value = quantize(current, b.min, b.max, b.step);
            }
        }
    }

    /// Interactive update: clamp and quantise, fire `on_change`, stage a
    /// [`Mutation::Set`]. Returns the applied value.
    pub fn on_user_input(&mut self, id: BindingId, raw: f64) -> Result<f64, BindingError> {
        if raw.is_nan() {
            return Err(BindingError::InvalidValue(raw));
        }
        let b = self.binding_mut(id)?;
        let value = quantize(raw, b.min, b.max, b.step);
        b.value = value;
        if let Some(hook) = b.on_change.as_mut() {
            hook(value);
        }
        let field = b.field;
        self.queue.push(Mutation::Set {
            binding: id,
            field,
            value,
        });
        Ok(value)
    }

    /// Interaction finished: fire `on_commit` and stage a
    /// [`Mutation::Commit`] with the current value.
    pub fn on_commit_input(&mut self, id: BindingId) -> Result<(), BindingError> {
        let b = self.binding_mut(id)?;
        let value = b.value;
        if let Some(hook) = b.on_commit.as_mut() {
            hook(value);
        }
        let field = b.field;
        self.queue.push(Mutation::Commit {
            binding: id,
            field,
            value,
        });
        Ok(())
    }

    pub fn pending(&self) -> &[Mutation] {
        &self.queue
    }

    pub fn record_failure(&mut self, id: BindingId, reason: impl Into<String>) {
        if let Some(b) = self.bindings.get_mut(&id) {
            b.last_failure = Some(reason.into());
        }
    }

    pub fn last_failure(&self, id: BindingId) -> Option<&str> {
        self.bindings.get(&id).and_then(TunableBinding::last_failure)
    }

    /// Drain the queue into `target` in staging order.
    ///
    /// A failed set or commit is recorded on its binding and reported; the
    /// remaining mutations still apply.
    pub fn apply_pending<T: BindingTarget + ?Sized>(&mut self, target: &mut T) -> ApplyReport {
        let mut report = ApplyReport::default();
        for mutation in std::mem::take(&mut self.queue) {
            let id = mutation.binding();
            let result = match mutation {
                Mutation::Set { field, value, .. } => {
                    report.sets += 1;
                    target.set_field(&field, value)
                }
                Mutation::Commit { field, value, .. } => {
                    report.commits += 1;
                    target.commit_field(&field, value)
                }
            };
            match result {
                Ok(()) => {
                    if let (Mutation::Commit { .. }, Some(b)) =
                        (mutation, self.bindings.get_mut(&id))
                    {
                        b.last_failure = None;
                    }
                }
                Err(err) => {
                    let reason = err.to_string();
                    tracing::warn!(binding = %id, %reason, "binding mutation failed");
                    self.record_failure(id, reason.clone());
                    report.failures.push((id, reason));
                }
            }
        }
        report
    }

    /// Tear down every binding in `section` and discard anything they staged.
    /// Returns how many bindings were released.
    pub fn release_section(&mut self, section: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, b| b.section != section);
        let bindings = &self.bindings;
        self.queue.retain(|m| bindings.contains_key(&m.binding()));
        let released = before - self.bindings.len();
        tracing::debug!(section, released, "binding section released");
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaterialField;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vista_common::{Axis, NodeId};
    use vista_scene::GeometryParam;

    const NODE: NodeId = NodeId::new(1, 0);

    fn subdivision() -> FieldRef {
        FieldRef::Geometry {
            node: NODE,
            param: GeometryParam::Subdivision,
        }
    }

    #[derive(Default)]
    struct Recorder {
        sets: Vec<(FieldRef, f64)>,
        commits: Vec<(FieldRef, f64)>,
        fail_commit: bool,
    }

    impl BindingTarget for Recorder {
        type Error = String;

        fn read_field(&self, field: &FieldRef) -> Option<f64> {
            match field {
                FieldRef::CameraFov => Some(75.0),
                _ => None,
            }
        }

        fn set_field(&mut self, field: &FieldRef, value: f64) -> Result<(), String> {
            self.sets.push((*field, value));
            Ok(())
        }

        fn commit_field(&mut self, field: &FieldRef, value: f64) -> Result<(), String> {
            if self.fail_commit {
                return Err("bad parameters".into());
            }
            self.commits.push((*field, value));
            Ok(())
        }
    }

    #[test]
    fn quantize_clamps_and_snaps() {
        assert_eq!(quantize(0.0, 1.0, 20.0, 1.0), 1.0);
        assert_eq!(quantize(7.4, 1.0, 20.0, 1.0), 7.0);
        assert_eq!(quantize(7.6, 1.0, 20.0, 1.0), 8.0);
        assert_eq!(quantize(99.0, 1.0, 20.0, 1.0), 20.0);
        assert_eq!(quantize(-3.0, -3.0, 3.0, 0.5), -3.0);
        assert_eq!(quantize(0.26, 0.0, 1.0, 0.25), 0.25);
    }

    #[test]
    fn quantize_stays_in_range_when_bound_is_not_a_multiple() {
        // nearest multiple of 0.25 to 0.1 is 0, which is out of range
        assert_eq!(quantize(0.1, 0.1, 1.0, 0.25), 0.25);
        assert_eq!(quantize(0.95, 0.0, 0.95, 0.25), 0.75);
        // no multiple fits at all
        assert_eq!(quantize(0.15, 0.1, 0.2, 0.25), 0.15);
    }

    #[test]
    fn bind_rejects_bad_ranges() {
        let mut reg = BindingRegistry::new();
        assert!(reg.bind("s", FieldRef::CameraFov, 5.0, 1.0, 1.0).is_err());
        assert!(reg.bind("s", FieldRef::CameraFov, 0.0, 1.0, 0.0).is_err());
        assert!(reg
            .bind("s", FieldRef::CameraFov, f64::NAN, 1.0, 0.1)
            .is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn subdivision_input_scenario() {
        let mut reg = BindingRegistry::new();
        let id = reg.bind("Debug", subdivision(), 1.0, 20.0, 1.0).unwrap();
        assert_eq!(reg.on_user_input(id, 0.0).unwrap(), 1.0);
        assert_eq!(reg.on_user_input(id, 7.4).unwrap(), 7.0);
        assert_eq!(reg.get(id).unwrap().value(), 7.0);
        assert_eq!(reg.pending().len(), 2);
    }

    #[test]
    fn hooks_fire_with_applied_values() {
        let mut reg = BindingRegistry::new();
        let id = reg.bind("Debug", subdivision(), 1.0, 20.0, 1.0).unwrap();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let commits = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        reg.on_change(id, move |v| c.borrow_mut().push(v)).unwrap();
        let c = commits.clone();
        reg.on_commit(id, move |v| c.borrow_mut().push(v)).unwrap();

        for raw in [2.2, 3.9, 5.1] {
            reg.on_user_input(id, raw).unwrap();
        }
        reg.on_commit_input(id).unwrap();
        assert_eq!(*changes.borrow(), vec![2.0, 4.0, 5.0]);
        assert_eq!(*commits.borrow(), vec![5.0]);
    }

    #[test]
    fn drag_then_commit_applies_one_commit() {
        let mut reg = BindingRegistry::new();
        let id = reg.bind("Debug", subdivision(), 1.0, 20.0, 1.0).unwrap();
        for raw in 2..10 {
            reg.on_user_input(id, raw as f64).unwrap();
        }
        reg.on_commit_input(id).unwrap();

        let mut target = Recorder::default();
        let report = reg.apply_pending(&mut target);
        assert_eq!(report.sets, 8);
        assert_eq!(report.commits, 1);
        assert_eq!(target.commits, vec![(subdivision(), 9.0)]);
        assert!(reg.pending().is_empty());
    }

    #[test]
    fn failed_commit_is_recorded() {
        let mut reg = BindingRegistry::new();
        let id = reg.bind("Debug", subdivision(), 1.0, 20.0, 1.0).unwrap();
        reg.on_commit_input(id).unwrap();
        let mut target = Recorder {
            fail_commit: true,
            ..Default::default()
        };
        let report = reg.apply_pending(&mut target);
        assert_eq!(report.failures, vec![(id, "bad parameters".to_string())]);
        assert_eq!(reg.last_failure(id), Some("bad parameters"));

        target.fail_commit = false;
        reg.on_commit_input(id).unwrap();
        reg.apply_pending(&mut target);
        assert_eq!(reg.last_failure(id), None);
    }

    #[test]
    fn nan_input_rejected() {
        let mut reg = BindingRegistry::new();
        let id = reg.bind("s", FieldRef::CameraFov, 10.0, 120.0, 1.0).unwrap();
        assert!(matches!(
            reg.on_user_input(id, f64::NAN),
            Err(BindingError::InvalidValue(_))
        ));
        assert!(reg.pending().is_empty());
    }

    #[test]
    fn unknown_binding() {
        let mut reg = BindingRegistry::new();
        assert_eq!(
            reg.on_user_input(BindingId(42), 1.0),
            Err(BindingError::UnknownBinding(BindingId(42)))
        );
    }

    #[test]
    fn seed_reads_target() {
        let mut reg = BindingRegistry::new();
        let fov = reg.bind("Camera", FieldRef::CameraFov, 10.0, 120.0, 1.0).unwrap();
        let pos = reg
            .bind(
                "Camera",
                FieldRef::Position {
                    node: NODE,
                    axis: Axis::X,
                },
                -3.0,
                3.0,
                0.01,
            )
            .unwrap();
        reg.seed_all(&Recorder::default());
        assert_eq!(reg.get(fov).unwrap().value(), 75.0);
        assert_eq!(reg.get(pos).unwrap().value(), -3.0);
        assert!(reg.pending().is_empty());
    }

    #[test]
    fn release_section_discards_pending() {
        let mut reg = BindingRegistry::new();
        let a = reg.bind("Debug", subdivision(), 1.0, 20.0, 1.0).unwrap();
        let b = reg
            .bind_toggle(
                "Material",
                FieldRef::Material {
                    node: NODE,
                    field: MaterialField::Wireframe,
                },
            )
            .unwrap();
        reg.on_user_input(a, 3.0).unwrap();
        reg.on_user_input(b, 1.0).unwrap();
        assert_eq!(reg.sections(), vec!["Debug", "Material"]);

        assert_eq!(reg.release_section("Debug"), 1);
        assert!(reg.get(a).is_none());
        assert_eq!(reg.pending().len(), 1);
        assert_eq!(reg.pending()[0].binding(), b);
        assert!(reg.on_user_input(a, 2.0).is_err());
    }
}
