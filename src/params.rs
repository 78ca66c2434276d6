//! Launch parameters
//!
//! A parameter set is a plain name → number map. Every archetype publishes a
//! schema (label, unit, slider step and range, default) that the UI renders;
//! the core itself never clamps to those ranges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::sim::Archetype;

/// Parameter identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamId {
    ProjectileArmLength,
    CounterweightArmLength,
    ArmMass,
    CounterweightMass,
    CounterweightSize,
    ProjectileMass,
    /// Diameter
    ProjectileSize,
    SlingLength,
    /// Degrees above horizontal
    ReleaseAngle,
    PivotHeight,
    /// Whipper only
    WhipLength,
}

impl ParamId {
    pub const ALL: [ParamId; 11] = [
        ParamId::ProjectileArmLength,
        ParamId::CounterweightArmLength,
        ParamId::ArmMass,
        ParamId::CounterweightMass,
        ParamId::CounterweightSize,
        ParamId::ProjectileMass,
        ParamId::ProjectileSize,
        ParamId::SlingLength,
        ParamId::ReleaseAngle,
        ParamId::PivotHeight,
        ParamId::WhipLength,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamId::ProjectileArmLength => "projectileArmLength",
            ParamId::CounterweightArmLength => "counterweightArmLength",
            ParamId::ArmMass => "armMass",
            ParamId::CounterweightMass => "counterweightMass",
            ParamId::CounterweightSize => "counterweightSize",
            ParamId::ProjectileMass => "projectileMass",
            ParamId::ProjectileSize => "projectileSize",
            ParamId::SlingLength => "slingLength",
            ParamId::ReleaseAngle => "releaseAngle",
            ParamId::PivotHeight => "pivotHeight",
            ParamId::WhipLength => "whipLength",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Masses, sizes and lengths can't go negative
    fn is_non_negative(&self) -> bool {
        !matches!(self, ParamId::ReleaseAngle)
    }

    /// A zero here builds a machine that never moves
    fn is_positive(&self) -> bool {
        matches!(
            self,
            ParamId::ArmMass
                | ParamId::CounterweightMass
                | ParamId::CounterweightSize
                | ParamId::ProjectileMass
                | ParamId::ProjectileSize
        )
    }

    /// Range and default shared by every archetype
    pub fn spec(&self) -> ParamSpec {
        let (label, unit, step, min, max, default) = match self {
            ParamId::ProjectileArmLength => ("Projectile arm length", "m", 0.5, 2.0, 30.0, 14.0),
            ParamId::CounterweightArmLength => ("Counterweight arm length", "m", 0.5, 1.0, 15.0, 6.0),
            ParamId::ArmMass => ("Arm mass", "kg", 1.0, 1.0, 500.0, 20.0),
            ParamId::CounterweightMass => ("Counterweight mass", "kg", 10.0, 10.0, 2000.0, 200.0),
            ParamId::CounterweightSize => ("Counterweight size", "m", 0.1, 0.2, 5.0, 1.0),
            ParamId::ProjectileMass => ("Projectile mass", "kg", 0.5, 0.5, 100.0, 4.0),
            ParamId::ProjectileSize => ("Projectile diameter", "m", 0.05, 0.1, 2.0, 0.5),
            ParamId::SlingLength => ("Sling length", "m", 0.5, 0.0, 30.0, 12.0),
            ParamId::ReleaseAngle => ("Release angle", "°", 1.0, 0.0, 90.0, 45.0),
            ParamId::PivotHeight => ("Pivot height", "m", 0.5, 2.0, 30.0, 10.0),
            ParamId::WhipLength => ("Whip length", "m", 0.5, 1.0, 15.0, 4.0),
        };
        ParamSpec {
            id: *self,
            label,
            unit,
            step,
            min,
            max,
            default,
        }
    }

    pub fn default_value(&self) -> f32 {
        self.spec().default
    }

    /// Reject values the engine can't represent. Range limits are the UI's job.
    pub fn validate(&self, value: f32) -> SimResult<()> {
        if !value.is_finite() {
            return Err(SimError::InvalidParameter {
                name: self.as_str(),
                value,
                reason: "must be finite",
            });
        }
        if self.is_positive() && value <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: self.as_str(),
                value,
                reason: "must be positive",
            });
        }
        if self.is_non_negative() && value < 0.0 {
            return Err(SimError::InvalidParameter {
                name: self.as_str(),
                value,
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}

/// One slider in the parameter form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub id: ParamId,
    pub label: &'static str,
    pub unit: &'static str,
    pub step: f32,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

/// Parameter schema exposed by an archetype
pub fn default_parameters(archetype: Archetype) -> Vec<ParamSpec> {
    let mut specs: Vec<ParamSpec> = ParamId::ALL
        .iter()
        .filter(|id| **id != ParamId::WhipLength || archetype == Archetype::Whipper)
        .map(ParamId::spec)
        .collect();

    if archetype == Archetype::Sandbox {
        // Free experimentation: open every range up, keep the angle physical
        for spec in specs.iter_mut().filter(|s| s.id != ParamId::ReleaseAngle) {
            spec.min *= 0.5;
            spec.max *= 2.0;
        }
    }
    specs
}

/// Named numeric parameters for one build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<ParamId, f32>,
}

impl ParameterSet {
    /// Empty set; every lookup falls back to the shared default
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults from an archetype's schema
    pub fn defaults_for(archetype: Archetype) -> Self {
        Self {
            values: default_parameters(archetype)
                .into_iter()
                .map(|spec| (spec.id, spec.default))
                .collect(),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.default_value())
    }

    /// Builder-style override
    pub fn with(mut self, id: ParamId, value: f32) -> Self {
        self.values.insert(id, value);
        self
    }

    /// Validated update by id
    pub fn set(&mut self, id: ParamId, value: f32) -> SimResult<()> {
        id.validate(value)?;
        self.values.insert(id, value);
        Ok(())
    }

    /// Validated update by UI name
    pub fn set_named(&mut self, name: &str, value: f32) -> SimResult<ParamId> {
        let id = ParamId::from_name(name).ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        self.set(id, value)?;
        Ok(id)
    }

    /// Check every stored value
    pub fn validate(&self) -> SimResult<()> {
        self.values.iter().try_for_each(|(id, value)| id.validate(*value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        self.values.iter().map(|(id, v)| (*id, *v))
    }
}
