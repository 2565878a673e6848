//! The group command surface.
//!
//! Each command is validated in full before anything is written, so a
//! failing command leaves the world and the statistics untouched.
//! [`CommandMode::DryRun`] stops right after validation.

use super::autogroup::{AutoGroupPlanner, AutoGroupReport};
use super::heuristic::Heuristic;
use super::naming::validate_name;
use crate::error::{messages, FleetError, OptionContext, Result};
use crate::model::{
    CompanyId, DomainEvent, Group, GroupId, Money, VehicleId, VehicleType, World,
};
use crate::stats::StatisticsAggregator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum GroupCommand {
    CreateGroup {
        vehicle_type: VehicleType,
        #[serde(default)]
        parent: Option<GroupId>,
    },
    /// Deletes the group and all of its sub-groups
    DeleteGroup { group: GroupId },
    /// An empty name resets to the generated default
    RenameGroup { group: GroupId, name: String },
    ReparentGroup {
        group: GroupId,
        #[serde(default)]
        parent: Option<GroupId>,
    },
    /// `group` may be [`GroupId::NEW`] or [`GroupId::DEFAULT`]
    AddVehicleToGroup {
        group: GroupId,
        vehicle: VehicleId,
        #[serde(default)]
        include_shared: bool,
    },
    /// Pull every vehicle sharing orders with a member into the group
    AddSharedToGroup { group: GroupId },
    RemoveAllVehicles { group: GroupId },
    SetReplaceProtection {
        group: GroupId,
        protect: bool,
        #[serde(default)]
        recursive: bool,
    },
    ResetAllGroupNames { vehicle_type: VehicleType },
    AutoGroup {
        vehicle_type: VehicleType,
        heuristic: Heuristic,
    },
}

impl GroupCommand {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateGroup { .. } => "create-group",
            Self::DeleteGroup { .. } => "delete-group",
            Self::RenameGroup { .. } => "rename-group",
            Self::ReparentGroup { .. } => "reparent-group",
            Self::AddVehicleToGroup { .. } => "add-vehicle-to-group",
            Self::AddSharedToGroup { .. } => "add-shared-to-group",
            Self::RemoveAllVehicles { .. } => "remove-all-vehicles",
            Self::SetReplaceProtection { .. } => "set-replace-protection",
            Self::ResetAllGroupNames { .. } => "reset-all-group-names",
            Self::AutoGroup { .. } => "auto-group",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandMode {
    /// Validate and report, write nothing
    DryRun,
    #[default]
    Exec,
}

/// Result of a successful command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutcome {
    /// Group commands are free
    pub cost: Money,
    pub new_group: Option<GroupId>,
    /// Vehicles whose group changes (or would change on a dry run)
    pub affected_vehicles: Vec<VehicleId>,
    /// Moves actually performed, in order
    pub events: Vec<DomainEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AutoGroupReport>,
}

impl CommandOutcome {
    fn affecting(vehicles: Vec<VehicleId>) -> Self {
        Self {
            affected_vehicles: vehicles,
            ..Self::default()
        }
    }
}

pub struct GroupCommandExecutor<'a> {
    world: &'a mut World,
    stats: &'a mut StatisticsAggregator,
    max_name_chars: usize,
}

impl<'a> GroupCommandExecutor<'a> {
    pub fn new(
        world: &'a mut World,
        stats: &'a mut StatisticsAggregator,
        max_name_chars: usize,
    ) -> Self {
        Self {
            world,
            stats,
            max_name_chars,
        }
    }

    pub fn execute(
        &mut self,
        actor: CompanyId,
        command: &GroupCommand,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        self.world
            .company(actor)
            .or_invalid(messages::UNKNOWN_COMPANY, format!("actor {actor}"))?;
        let outcome = match command {
            GroupCommand::CreateGroup {
                vehicle_type,
                parent,
            } => self.create(actor, *vehicle_type, *parent, mode),
            GroupCommand::DeleteGroup { group } => self.delete(actor, *group, mode),
            GroupCommand::RenameGroup { group, name } => self.rename(actor, *group, name, mode),
            GroupCommand::ReparentGroup { group, parent } => {
                self.reparent(actor, *group, *parent, mode)
            }
            GroupCommand::AddVehicleToGroup {
                group,
                vehicle,
                include_shared,
            } => self.add_vehicle(actor, *group, *vehicle, *include_shared, mode),
            GroupCommand::AddSharedToGroup { group } => self.add_shared(actor, *group, mode),
            GroupCommand::RemoveAllVehicles { group } => self.remove_all(actor, *group, mode),
            GroupCommand::SetReplaceProtection {
                group,
                protect,
                recursive,
            } => self.set_protection(actor, *group, *protect, *recursive, mode),
            GroupCommand::ResetAllGroupNames { vehicle_type } => {
                self.reset_names(actor, *vehicle_type, mode)
            }
            GroupCommand::AutoGroup {
                vehicle_type,
                heuristic,
            } => self.auto_group(actor, *vehicle_type, *heuristic, mode),
        };
        match &outcome {
            Ok(o) => tracing::debug!(
                "{} by {actor} ({mode:?}): {} vehicles affected",
                command.name(),
                o.affected_vehicles.len()
            ),
            Err(e) => tracing::debug!("{} by {actor} rejected: {e}", command.name()),
        }
        outcome
    }

    // ========================================================================
    // Commands
    // ========================================================================

    fn create(
        &mut self,
        actor: CompanyId,
        vehicle_type: VehicleType,
        parent: Option<GroupId>,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        if let Some(parent) = parent {
            self.world.check_group_scope(parent, actor, vehicle_type)?;
        }
        self.world.allocate_group_id()?;
        if mode == CommandMode::DryRun {
            return Ok(CommandOutcome::default());
        }
        let id = self.create_group(actor, vehicle_type, parent)?;
        Ok(CommandOutcome {
            new_group: Some(id),
            ..CommandOutcome::default()
        })
    }

    fn delete(&mut self, actor: CompanyId, group: GroupId, mode: CommandMode) -> Result<CommandOutcome> {
        let vehicle_type = self.owned_group(actor, group)?.vehicle_type;
        let subtree = self.world.group_subtree(group);
        let members = self.members_of(actor, vehicle_type, |g| subtree.contains(&g));
        if mode == CommandMode::DryRun {
            return Ok(CommandOutcome::affecting(members));
        }
        let events = self.move_all(&members, GroupId::DEFAULT)?;
        // children first
        for id in subtree.into_iter().rev() {
            self.world.remove_group(id);
            self.stats.remove_group(actor, id, vehicle_type);
        }
        self.stats.update_autoreplace(self.world, actor);
        Ok(CommandOutcome {
            affected_vehicles: members,
            events,
            ..CommandOutcome::default()
        })
    }

    fn rename(
        &mut self,
        actor: CompanyId,
        group: GroupId,
        name: &str,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let vehicle_type = self.owned_group(actor, group)?.vehicle_type;
        let name = if name.is_empty() {
            None
        } else {
            validate_name(self.world, actor, vehicle_type, Some(group), name, self.max_name_chars)?;
            Some(name.to_string())
        };
        if mode == CommandMode::Exec {
            self.world.group_mut(group)?.name = name;
        }
        Ok(CommandOutcome::default())
    }

    fn reparent(
        &mut self,
        actor: CompanyId,
        group: GroupId,
        parent: Option<GroupId>,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let vehicle_type = self.owned_group(actor, group)?.vehicle_type;
        if let Some(parent) = parent {
            self.world.check_group_scope(parent, actor, vehicle_type)?;
            if self.world.is_group_in_subtree(parent, group) {
                return Err(FleetError::invariant(
                    messages::GROUP_CYCLE,
                    format!("{parent} is inside the subtree of {group}"),
                ));
            }
        }
        if mode == CommandMode::Exec {
            self.world.group_mut(group)?.parent = parent;
        }
        Ok(CommandOutcome::default())
    }

    fn add_vehicle(
        &mut self,
        actor: CompanyId,
        group: GroupId,
        vehicle: VehicleId,
        include_shared: bool,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let v = self
            .world
            .vehicle(vehicle)
            .or_invalid(messages::UNKNOWN_VEHICLE, format!("{vehicle}"))?;
        if !v.is_primary() {
            return Err(FleetError::invalid_argument(
                messages::NOT_PRIMARY_VEHICLE,
                format!("{vehicle} is attached to {}", v.primary()),
            ));
        }
        if v.owner != actor {
            return Err(FleetError::not_owner(format!("{vehicle} belongs to {}", v.owner)));
        }
        let vehicle_type = v.vehicle_type;
        let members = if include_shared {
            self.world.sharers_of(v)
        } else {
            vec![vehicle]
        };

        if group == GroupId::NEW {
            self.world.allocate_group_id()?;
        } else if group.is_real() {
            self.world.check_group_scope(group, actor, vehicle_type)?;
        } else if !group.is_default() {
            return Err(FleetError::invalid_argument(
                messages::UNKNOWN_GROUP,
                format!("vehicles cannot be added to {group}"),
            ));
        }
        let affected: Vec<VehicleId> = members
            .into_iter()
            .filter(|id| group == GroupId::NEW || self.world.vehicle(*id).is_some_and(|m| m.group != group))
            .collect();
        if mode == CommandMode::DryRun {
            return Ok(CommandOutcome::affecting(affected));
        }

        let (target, new_group) = if group == GroupId::NEW {
            let id = self.create_group(actor, vehicle_type, None)?;
            (id, Some(id))
        } else {
            (group, None)
        };
        let events = self.move_all(&affected, target)?;
        self.stats.update_autoreplace(self.world, actor);
        Ok(CommandOutcome {
            new_group,
            affected_vehicles: affected,
            events,
            ..CommandOutcome::default()
        })
    }

    fn add_shared(&mut self, actor: CompanyId, group: GroupId, mode: CommandMode) -> Result<CommandOutcome> {
        let vehicle_type = self.owned_group(actor, group)?.vehicle_type;
        let lists: BTreeSet<_> = self
            .world
            .primary_vehicles(actor, vehicle_type)
            .filter(|v| v.group == group)
            .filter_map(|v| v.order_list)
            .collect();
        let mut affected: Vec<VehicleId> = lists
            .into_iter()
            .filter_map(|id| self.world.order_list(id))
            .flat_map(|list| list.sharers.iter().copied())
            .filter(|id| {
                self.world.vehicle(*id).is_some_and(|v| {
                    v.owner == actor && v.vehicle_type == vehicle_type && v.group != group
                })
            })
            .collect();
        affected.sort();
        affected.dedup();
        if mode == CommandMode::DryRun {
            return Ok(CommandOutcome::affecting(affected));
        }
        let events = self.move_all(&affected, group)?;
        self.stats.update_autoreplace(self.world, actor);
        Ok(CommandOutcome {
            affected_vehicles: affected,
            events,
            ..CommandOutcome::default()
        })
    }

    fn remove_all(&mut self, actor: CompanyId, group: GroupId, mode: CommandMode) -> Result<CommandOutcome> {
        let vehicle_type = self.owned_group(actor, group)?.vehicle_type;
        let members = self.members_of(actor, vehicle_type, |g| g == group);
        if mode == CommandMode::DryRun {
            return Ok(CommandOutcome::affecting(members));
        }
        let events = self.move_all(&members, GroupId::DEFAULT)?;
        self.stats.update_autoreplace(self.world, actor);
        Ok(CommandOutcome {
            affected_vehicles: members,
            events,
            ..CommandOutcome::default()
        })
    }

    fn set_protection(
        &mut self,
        actor: CompanyId,
        group: GroupId,
        protect: bool,
        recursive: bool,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        self.owned_group(actor, group)?;
        let targets = if recursive {
            self.world.group_subtree(group)
        } else {
            vec![group]
        };
        if mode == CommandMode::Exec {
            for id in targets {
                self.world.group_mut(id)?.replace_protection = protect;
            }
        }
        Ok(CommandOutcome::default())
    }

    fn reset_names(
        &mut self,
        actor: CompanyId,
        vehicle_type: VehicleType,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let named: Vec<GroupId> = self
            .world
            .groups_of(actor, vehicle_type)
            .filter(|g| g.name.is_some())
            .map(|g| g.id)
            .collect();
        if mode == CommandMode::Exec {
            for id in named {
                self.world.group_mut(id)?.name = None;
            }
        }
        Ok(CommandOutcome::default())
    }

    fn auto_group(
        &mut self,
        actor: CompanyId,
        vehicle_type: VehicleType,
        heuristic: Heuristic,
        mode: CommandMode,
    ) -> Result<CommandOutcome> {
        let mut planner = AutoGroupPlanner::new(self.world, self.stats, self.max_name_chars);
        let report = match mode {
            CommandMode::DryRun => planner.preflight(actor, vehicle_type, heuristic)?,
            CommandMode::Exec => planner.rebuild(actor, vehicle_type, heuristic)?,
        };
        let affected = report
            .groups
            .iter()
            .flat_map(|g| g.vehicles.iter().copied())
            .collect();
        Ok(CommandOutcome {
            affected_vehicles: affected,
            report: Some(report),
            ..CommandOutcome::default()
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// A real group the actor owns.
    fn owned_group(&self, actor: CompanyId, group: GroupId) -> Result<&Group> {
        let g = self
            .world
            .group(group)
            .or_invalid(messages::UNKNOWN_GROUP, format!("{group}"))?;
        if g.owner != actor {
            return Err(FleetError::not_owner(format!("{group} belongs to {}", g.owner)));
        }
        Ok(g)
    }

    fn members_of(
        &self,
        actor: CompanyId,
        vehicle_type: VehicleType,
        in_scope: impl Fn(GroupId) -> bool,
    ) -> Vec<VehicleId> {
        self.world
            .primary_vehicles(actor, vehicle_type)
            .filter(|v| in_scope(v.group))
            .map(|v| v.id)
            .collect()
    }

    fn create_group(
        &mut self,
        owner: CompanyId,
        vehicle_type: VehicleType,
        parent: Option<GroupId>,
    ) -> Result<GroupId> {
        let id = self.world.allocate_group_id()?;
        let replace_protection = parent
            .and_then(|p| self.world.group(p))
            .is_some_and(|p| p.replace_protection);
        self.world.insert_group(Group {
            id,
            owner,
            vehicle_type,
            parent,
            name: None,
            replace_protection,
        })?;
        self.stats.add_group(owner, id, vehicle_type);
        tracing::debug!("Created {id} for {owner}/{vehicle_type}");
        Ok(id)
    }

    fn move_all(&mut self, vehicles: &[VehicleId], to: GroupId) -> Result<Vec<DomainEvent>> {
        let mut events = Vec::with_capacity(vehicles.len());
        for id in vehicles {
            events.extend(self.move_vehicle(*id, to)?);
        }
        Ok(events)
    }

    /// Move one primary vehicle, keeping both buckets exact.
    fn move_vehicle(&mut self, id: VehicleId, to: GroupId) -> Result<Option<DomainEvent>> {
        let mut vehicle = self
            .world
            .vehicle(id)
            .cloned()
            .or_invalid(messages::UNKNOWN_VEHICLE, format!("{id}"))?;
        let from = vehicle.group;
        if from == to {
            return Ok(None);
        }
        self.count_chain(&vehicle, -1);
        self.world.vehicle_mut(id)?.group = to;
        vehicle.group = to;
        self.count_chain(&vehicle, 1);
        Ok(Some(DomainEvent::VehicleMovedToGroup {
            vehicle: id,
            from,
            to,
        }))
    }

    fn count_chain(&mut self, primary: &crate::model::Vehicle, delta: i32) {
        let world: &World = self.world;
        self.stats.count_vehicle(world, primary, delta);
        for unit in world.chain(primary.id) {
            self.stats.count_engine(world, unit, delta);
        }
    }
}
