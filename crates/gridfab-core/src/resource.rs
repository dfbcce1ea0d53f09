//! Resource model: enumerated resource kinds and the [`Count`] value type.

use serde::{Deserialize, Serialize};

/// Disjoint partition of resources. Each kind has its own storage rules:
/// materials queue up in a [`MaterialStorage`](crate::material::MaterialStorage),
/// liquids live one-at-a-time in a liquid tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Material,
    Liquid,
}

/// Every resource the simulation knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    // Materials
    Stone,
    Coal,
    Sand,
    Copper,
    Iron,
    Glass,
    Silicon,
    Steel,
    Circuit,
    // Liquids
    Water,
    Methane,
    Oil,
    Acid,
}

impl Resource {
    /// Every resource, materials first, in declaration order.
    pub const ALL: [Resource; 13] = [
        Resource::Stone,
        Resource::Coal,
        Resource::Sand,
        Resource::Copper,
        Resource::Iron,
        Resource::Glass,
        Resource::Silicon,
        Resource::Steel,
        Resource::Circuit,
        Resource::Water,
        Resource::Methane,
        Resource::Oil,
        Resource::Acid,
    ];

    /// All material resources.
    pub const MATERIALS: [Resource; 9] = [
        Resource::Stone,
        Resource::Coal,
        Resource::Sand,
        Resource::Copper,
        Resource::Iron,
        Resource::Glass,
        Resource::Silicon,
        Resource::Steel,
        Resource::Circuit,
    ];

    /// All liquid resources.
    pub const LIQUIDS: [Resource; 4] = [
        Resource::Water,
        Resource::Methane,
        Resource::Oil,
        Resource::Acid,
    ];

    /// Which storage partition this resource belongs to.
    pub fn kind(self) -> ResourceKind {
        match self {
            Resource::Water | Resource::Methane | Resource::Oil | Resource::Acid => {
                ResourceKind::Liquid
            }
            _ => ResourceKind::Material,
        }
    }

    pub fn is_material(self) -> bool {
        self.kind() == ResourceKind::Material
    }

    pub fn is_liquid(self) -> bool {
        self.kind() == ResourceKind::Liquid
    }

    /// Lower-case display name.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Stone => "stone",
            Resource::Coal => "coal",
            Resource::Sand => "sand",
            Resource::Copper => "copper",
            Resource::Iron => "iron",
            Resource::Glass => "glass",
            Resource::Silicon => "silicon",
            Resource::Steel => "steel",
            Resource::Circuit => "circuit",
            Resource::Water => "water",
            Resource::Methane => "methane",
            Resource::Oil => "oil",
            Resource::Acid => "acid",
        }
    }

    /// Look up a resource by its display name.
    pub fn from_name(name: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Count
// ---------------------------------------------------------------------------

/// Errors from constructing resource values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("count of {0} must have a positive quantity")]
    ZeroQuantity(Resource),
}

/// A positive quantity of a single resource.
///
/// The quantity is never zero: construction through [`Count::new`] or
/// [`Count::try_new`] rejects it, and deserialization goes through the same
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCount", into = "RawCount")]
pub struct Count {
    resource: Resource,
    quantity: u32,
}

impl Count {
    /// Create a count. Panics on a zero quantity; use [`Count::try_new`]
    /// for values that did not come from code.
    pub fn new(resource: Resource, quantity: u32) -> Self {
        assert!(quantity > 0, "count of {resource} must have a positive quantity");
        Self { resource, quantity }
    }

    /// Create a count, rejecting a zero quantity.
    pub fn try_new(resource: Resource, quantity: u32) -> Result<Self, ResourceError> {
        if quantity == 0 {
            return Err(ResourceError::ZeroQuantity(resource));
        }
        Ok(Self { resource, quantity })
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    /// The same resource with a different quantity, or `None` for zero.
    pub fn with_quantity(&self, quantity: u32) -> Option<Count> {
        Count::try_new(self.resource, quantity).ok()
    }
}

impl std::fmt::Display for Count {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.resource, self.quantity)
    }
}

/// Unchecked wire form of [`Count`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCount {
    resource: Resource,
    quantity: u32,
}

impl TryFrom<RawCount> for Count {
    type Error = ResourceError;

    fn try_from(raw: RawCount) -> Result<Self, Self::Error> {
        Count::try_new(raw.resource, raw.quantity)
    }
}

impl From<Count> for RawCount {
    fn from(count: Count) -> Self {
        RawCount {
            resource: count.resource,
            quantity: count.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_disjoint() {
        for r in Resource::MATERIALS {
            assert!(r.is_material());
            assert!(!Resource::LIQUIDS.contains(&r));
        }
        for r in Resource::LIQUIDS {
            assert!(r.is_liquid());
        }
        assert_eq!(
            Resource::MATERIALS.len() + Resource::LIQUIDS.len(),
            Resource::ALL.len()
        );
    }

    #[test]
    fn names_round_trip() {
        for r in Resource::ALL {
            assert_eq!(Resource::from_name(r.name()), Some(r));
        }
        assert_eq!(Resource::from_name("unobtainium"), None);
    }

    #[test]
    fn zero_count_rejected() {
        assert_eq!(
            Count::try_new(Resource::Iron, 0),
            Err(ResourceError::ZeroQuantity(Resource::Iron))
        );
        assert!(Count::try_new(Resource::Iron, 1).is_ok());
    }

    #[test]
    #[should_panic(expected = "positive quantity")]
    fn zero_count_panics_on_new() {
        let _ = Count::new(Resource::Coal, 0);
    }

    #[test]
    fn with_quantity() {
        let c = Count::new(Resource::Water, 5);
        assert_eq!(c.with_quantity(2), Some(Count::new(Resource::Water, 2)));
        assert_eq!(c.with_quantity(0), None);
    }

    #[test]
    fn deserialize_rejects_zero_quantity() {
        let ok: Count = serde_json::from_str(r#"{"resource":"Iron","quantity":3}"#).unwrap();
        assert_eq!(ok, Count::new(Resource::Iron, 3));
        let bad = serde_json::from_str::<Count>(r#"{"resource":"Iron","quantity":0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Count::new(Resource::Steel, 4).to_string(), "steel x4");
    }
}
