//! Group name validation and generated names.

use crate::error::{messages, FleetError, Result};
use crate::model::{CompanyId, GroupId, VehicleType, World};
use std::collections::HashSet;

/// Check a custom name for a group in `(owner, vehicle_type)`.
///
/// `renamed` is the group being renamed, which may keep its own name.
pub fn validate_name(
    world: &World,
    owner: CompanyId,
    vehicle_type: VehicleType,
    renamed: Option<GroupId>,
    name: &str,
    max_chars: usize,
) -> Result<()> {
    if name.chars().count() > max_chars {
        return Err(FleetError::invalid_argument(
            messages::NAME_TOO_LONG,
            format!("'{name}' is longer than {max_chars} characters"),
        ));
    }
    let taken = world
        .groups_of(owner, vehicle_type)
        .filter(|g| Some(g.id) != renamed)
        .any(|g| g.name.as_deref() == Some(name));
    if taken {
        return Err(FleetError::name_conflict(name));
    }
    Ok(())
}

/// Truncate to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}

/// Make a generated name unique among `taken` by appending ` (n)`,
/// trimming the base so the result stays within `max_chars`.
pub fn unique_name(base: &str, max_chars: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = truncate_chars(base, max_chars);
    let mut n = 2usize;
    while taken.contains(&candidate) {
        let suffix = format!(" ({n})");
        let room = max_chars.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", truncate_chars(base, room));
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}
