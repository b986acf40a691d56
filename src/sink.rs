use crate::lane::Heading;
use crate::math::{Point3d, Vector3d};
use crate::EntityId;

/// Receives the activation and kinematic writes the simulation makes on entities,
/// so a host can mirror them onto its own objects.
pub trait EntitySink {
    /// Shows or hides an entity.
    fn set_active(&mut self, id: EntityId, active: bool);
    /// Moves an entity and orients it along its heading.
    fn set_transform(&mut self, id: EntityId, position: Point3d, heading: Heading);
    /// Sets an entity's velocity.
    fn set_velocity(&mut self, id: EntityId, velocity: Vector3d);
}

/// Ignores all commands.
impl EntitySink for () {
    fn set_active(&mut self, _: EntityId, _: bool) {}
    fn set_transform(&mut self, _: EntityId, _: Point3d, _: Heading) {}
    fn set_velocity(&mut self, _: EntityId, _: Vector3d) {}
}

/// A command issued to an [EntitySink].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationCommand {
    SetActive(EntityId, bool),
    SetTransform(EntityId, Point3d, Heading),
    SetVelocity(EntityId, Vector3d),
}

/// Records all commands in order.
impl EntitySink for Vec<ActivationCommand> {
    fn set_active(&mut self, id: EntityId, active: bool) {
        self.push(ActivationCommand::SetActive(id, active));
    }

    fn set_transform(&mut self, id: EntityId, position: Point3d, heading: Heading) {
        self.push(ActivationCommand::SetTransform(id, position, heading));
    }

    fn set_velocity(&mut self, id: EntityId, velocity: Vector3d) {
        self.push(ActivationCommand::SetVelocity(id, velocity));
    }
}
