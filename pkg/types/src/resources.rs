use serde::{Deserialize, Serialize};

/// A CPU / memory / storage triple.
///
/// CPU is in cores, memory and storage in GiB. Values are signed so that
/// capacity arithmetic on a misconfigured zone (quota > capacity) yields a
/// negative result instead of wrapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResourceAmounts {
    #[serde(default)]
    pub cpu: i64,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub storage: i64,
}

/// One of the three governed resources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Memory,
    Storage,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Cpu, Resource::Memory, Resource::Storage];
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Cpu => write!(f, "cpu"),
            Resource::Memory => write!(f, "memory"),
            Resource::Storage => write!(f, "storage"),
        }
    }
}

impl ResourceAmounts {
    pub const fn new(cpu: i64, memory: i64, storage: i64) -> Self {
        Self {
            cpu,
            memory,
            storage,
        }
    }

    pub fn get(&self, resource: Resource) -> i64 {
        match resource {
            Resource::Cpu => self.cpu,
            Resource::Memory => self.memory,
            Resource::Storage => self.storage,
        }
    }

    /// Component-wise `self + other`, saturating at the i64 bounds.
    pub fn saturating_add(&self, other: &ResourceAmounts) -> ResourceAmounts {
        ResourceAmounts {
            cpu: self.cpu.saturating_add(other.cpu),
            memory: self.memory.saturating_add(other.memory),
            storage: self.storage.saturating_add(other.storage),
        }
    }

    /// Component-wise `self - other`. May go negative.
    pub fn saturating_sub(&self, other: &ResourceAmounts) -> ResourceAmounts {
        ResourceAmounts {
            cpu: self.cpu.saturating_sub(other.cpu),
            memory: self.memory.saturating_sub(other.memory),
            storage: self.storage.saturating_sub(other.storage),
        }
    }

    /// Component-wise clamp of negative values to zero.
    pub fn clamp_non_negative(&self) -> ResourceAmounts {
        ResourceAmounts {
            cpu: self.cpu.max(0),
            memory: self.memory.max(0),
            storage: self.storage.max(0),
        }
    }

    /// The first resource (in cpu, memory, storage order) for which
    /// `used + request > ceiling`, if any.
    pub fn first_exceeding(
        request: &ResourceAmounts,
        used: &ResourceAmounts,
        ceiling: &ResourceAmounts,
    ) -> Option<Resource> {
        Resource::ALL
            .into_iter()
            .find(|r| used.get(*r).saturating_add(request.get(*r)) > ceiling.get(*r))
    }

    /// The first negative component, if any.
    pub fn first_negative(&self) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| self.get(*r) < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_exceeding_reports_resource_in_order() {
        let ceiling = ResourceAmounts::new(10, 10, 10);
        let used = ResourceAmounts::new(5, 9, 0);
        assert_eq!(
            ResourceAmounts::first_exceeding(&ResourceAmounts::new(5, 2, 20), &used, &ceiling),
            Some(Resource::Memory)
        );
        assert_eq!(
            ResourceAmounts::first_exceeding(&ResourceAmounts::new(5, 1, 10), &used, &ceiling),
            None
        );
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let big = ResourceAmounts::new(i64::MAX, 1, 1);
        let sum = big.saturating_add(&ResourceAmounts::new(1, 1, 1));
        assert_eq!(sum.cpu, i64::MAX);
        assert_eq!(sum.memory, 2);
    }
}
