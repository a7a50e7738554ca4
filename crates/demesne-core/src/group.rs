//! Groups and the group registry

use crate::error::{Error, Result};
use crate::identity::{GroupId, Principal, PrincipalId};
use crate::role::Role;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default capacity granted to every group regardless of level
pub const CAPACITY_BASE: usize = 10;
/// Additional capacity per group level
pub const CAPACITY_PER_LEVEL: usize = 5;
/// Experience needed to go from level N to N+1 is `N * LEVEL_EXPERIENCE`
pub const LEVEL_EXPERIENCE: u64 = 1000;

/// A player-formed faction that owns cells and has a roster of principals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: GroupId,
    /// Unique display name
    pub name: String,
    /// The founding principal
    pub founder: PrincipalId,
    /// Members and their roles; always contains the founder
    pub roster: IndexMap<PrincipalId, Role>,
    /// Group level, at least 1
    pub level: u32,
    /// Experience towards the next level
    pub experience: u64,
    /// Treasury balance
    pub treasury: f64,
    /// When the group was founded
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a new level-1 group with the founder on the roster
    pub fn new(id: GroupId, name: impl Into<String>, founder: &Principal, now: DateTime<Utc>) -> Self {
        let mut roster = IndexMap::new();
        roster.insert(founder.id, Role::Founder);
        Self {
            id,
            name: name.into(),
            founder: founder.id,
            roster,
            level: 1,
            experience: 0,
            treasury: 0.0,
            created_at: now,
        }
    }

    /// Claim capacity at the default base and per-level rates
    pub fn capacity(&self) -> usize {
        self.capacity_with(CAPACITY_BASE, CAPACITY_PER_LEVEL)
    }

    /// Claim capacity with configured base and per-level rates
    pub fn capacity_with(&self, base: usize, per_level: usize) -> usize {
        base + per_level * self.level as usize
    }

    /// Whether a principal is on the roster
    pub fn is_member(&self, principal: PrincipalId) -> bool {
        self.roster.contains_key(&principal)
    }

    /// The role of a roster member
    pub fn role_of(&self, principal: PrincipalId) -> Option<Role> {
        self.roster.get(&principal).copied()
    }

    /// Add a principal to the roster
    pub fn add_member(&mut self, principal: PrincipalId, role: Role) -> Result<()> {
        if self.roster.contains_key(&principal) {
            return Err(Error::State(format!(
                "{} is already a member of {}",
                principal, self.name
            )));
        }
        if role == Role::Founder {
            return Err(Error::Validation(
                "a group has exactly one founder".to_string(),
            ));
        }
        self.roster.insert(principal, role);
        Ok(())
    }

    /// Remove a principal from the roster; the founder cannot leave
    pub fn remove_member(&mut self, principal: PrincipalId) -> Result<()> {
        if principal == self.founder {
            return Err(Error::State(format!(
                "the founder cannot be removed from {}",
                self.name
            )));
        }
        if self.roster.shift_remove(&principal).is_none() {
            return Err(Error::NotFound(format!(
                "{} is not a member of {}",
                principal, self.name
            )));
        }
        Ok(())
    }

    /// Change a member's role; the founder's rank is fixed
    pub fn set_role(&mut self, principal: PrincipalId, role: Role) -> Result<()> {
        if principal == self.founder {
            return Err(Error::State(format!(
                "the founder's role in {} cannot change",
                self.name
            )));
        }
        if role == Role::Founder {
            return Err(Error::Validation(
                "a group has exactly one founder".to_string(),
            ));
        }
        match self.roster.get_mut(&principal) {
            Some(slot) => {
                *slot = role;
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "{} is not a member of {}",
                principal, self.name
            ))),
        }
    }

    /// Pay into the treasury
    pub fn deposit(&mut self, amount: f64) -> Result<()> {
        if !(amount > 0.0) {
            return Err(Error::Validation("deposit must be positive".to_string()));
        }
        self.treasury += amount;
        Ok(())
    }

    /// Take from the treasury
    pub fn withdraw(&mut self, amount: f64) -> Result<()> {
        if !(amount > 0.0) {
            return Err(Error::Validation("withdrawal must be positive".to_string()));
        }
        if amount > self.treasury {
            return Err(Error::InsufficientFunds {
                requested: amount,
                available: self.treasury,
            });
        }
        self.treasury -= amount;
        Ok(())
    }

    /// Award experience; returns `true` if the group leveled up
    ///
    /// Leveling raises claim capacity through [`Group::capacity`]. Excess
    /// experience carries over.
    pub fn add_experience(&mut self, points: u64) -> bool {
        self.experience += points;
        let mut leveled = false;
        loop {
            let threshold = self.level as u64 * LEVEL_EXPERIENCE;
            if self.experience < threshold {
                break;
            }
            self.experience -= threshold;
            self.level += 1;
            leveled = true;
        }
        leveled
    }
}

/// Registry of all live groups, indexed by id and by unique name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRegistry {
    groups: IndexMap<GroupId, Group>,
    by_name: IndexMap<String, GroupId>,
    next_id: u64,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new group, enforcing name uniqueness
    pub fn create(
        &mut self,
        name: impl Into<String>,
        founder: &Principal,
        now: DateTime<Utc>,
    ) -> Result<GroupId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Validation("group name must not be empty".to_string()));
        }
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        let id = GroupId::new(self.next_id);
        self.next_id += 1;
        self.by_name.insert(name.clone(), id);
        self.groups.insert(id, Group::new(id, name, founder, now));
        Ok(id)
    }

    /// Look up a group by id
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Look up a group mutably by id
    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    /// Look up a group by unique name
    pub fn by_name(&self, name: &str) -> Option<&Group> {
        self.by_name.get(name).and_then(|id| self.groups.get(id))
    }

    /// Remove a group, returning it for cascade cleanup
    pub fn remove(&mut self, id: GroupId) -> Option<Group> {
        let group = self.groups.shift_remove(&id)?;
        self.by_name.shift_remove(&group.name);
        Some(group)
    }

    /// Whether the registry holds this id
    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Iterate all groups
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Number of live groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Re-insert a loaded group, used when booting from storage
    pub fn restore(&mut self, group: Group) {
        self.next_id = self.next_id.max(group.id.raw() + 1);
        self.by_name.insert(group.name.clone(), group.id);
        self.groups.insert(group.id, group);
    }
}
