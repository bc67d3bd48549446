//! Attributes, protections and talents

use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};

/// Number of attributes
pub const ATR_MAX: usize = 8;
/// Number of protection kinds
pub const PROT_MAX: usize = 8;
/// Number of talent slots
pub const TALENT_MAX: usize = 22;

/// Actor attribute, numbered like the script interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Attribute {
    Hitpoints = 0,
    HitpointsMax = 1,
    Mana = 2,
    ManaMax = 3,
    Strength = 4,
    Dexterity = 5,
    /// Seconds per regenerated hitpoint, 0 disables
    RegenerateHp = 6,
    /// Seconds per regenerated mana point, 0 disables
    RegenerateMana = 7,
}

impl Attribute {
    /// From the script index
    pub fn from_index(index: u8) -> Result<Self> {
        Ok(match index {
            0 => Attribute::Hitpoints,
            1 => Attribute::HitpointsMax,
            2 => Attribute::Mana,
            3 => Attribute::ManaMax,
            4 => Attribute::Strength,
            5 => Attribute::Dexterity,
            6 => Attribute::RegenerateHp,
            7 => Attribute::RegenerateMana,
            _ => return Err(AiError::InvalidAttribute(index)),
        })
    }

    /// Attribute holding the upper bound of this one, if any
    pub fn max_attribute(&self) -> Option<Attribute> {
        match self {
            Attribute::Hitpoints => Some(Attribute::HitpointsMax),
            Attribute::Mana => Some(Attribute::ManaMax),
            _ => None,
        }
    }
}

/// Damage protection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Protection {
    Barrier = 0,
    Blunt = 1,
    Edge = 2,
    Fire = 3,
    Fly = 4,
    Magic = 5,
    Point = 6,
    Fall = 7,
}

impl Protection {
    /// From the script index
    pub fn from_index(index: u8) -> Result<Self> {
        Ok(match index {
            0 => Protection::Barrier,
            1 => Protection::Blunt,
            2 => Protection::Edge,
            3 => Protection::Fire,
            4 => Protection::Fly,
            5 => Protection::Magic,
            6 => Protection::Point,
            7 => Protection::Fall,
            _ => return Err(AiError::InvalidProtection(index)),
        })
    }
}

/// Talent slot index (`0..TALENT_MAX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Talent(pub u8);

impl Talent {
    pub const ONE_HANDED: Talent = Talent(1);
    pub const TWO_HANDED: Talent = Talent(2);
    pub const BOW: Talent = Talent(3);
    pub const CROSSBOW: Talent = Talent(4);
    pub const PICKLOCK: Talent = Talent(5);
    pub const MAGE: Talent = Talent(7);
    pub const SNEAK: Talent = Talent(8);
    pub const REGENERATE: Talent = Talent(9);
    pub const ACROBAT: Talent = Talent(11);
}

/// Attribute, protection and talent arrays of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    values: [i32; ATR_MAX],
    protections: [i32; PROT_MAX],
    talent_skill: Vec<i32>,
    talent_value: Vec<i32>,
    /// Milliseconds accumulated towards the next regenerated point
    regen_hp_ms: u64,
    regen_mana_ms: u64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            values: [0; ATR_MAX],
            protections: [0; PROT_MAX],
            talent_skill: vec![0; TALENT_MAX],
            talent_value: vec![0; TALENT_MAX],
            regen_hp_ms: 0,
            regen_mana_ms: 0,
        }
    }
}

impl Attributes {
    /// Full health and mana
    pub fn new(hitpoints: i32, mana: i32) -> Self {
        let mut attrs = Self::default();
        attrs.values[Attribute::HitpointsMax as usize] = hitpoints.max(0);
        attrs.values[Attribute::Hitpoints as usize] = hitpoints.max(0);
        attrs.values[Attribute::ManaMax as usize] = mana.max(0);
        attrs.values[Attribute::Mana as usize] = mana.max(0);
        attrs
    }

    /// Set strength and dexterity
    pub fn with_stats(mut self, strength: i32, dexterity: i32) -> Self {
        self.values[Attribute::Strength as usize] = strength;
        self.values[Attribute::Dexterity as usize] = dexterity;
        self
    }

    /// Set regeneration periods in seconds per point
    pub fn with_regeneration(mut self, hp_secs: i32, mana_secs: i32) -> Self {
        self.values[Attribute::RegenerateHp as usize] = hp_secs.max(0);
        self.values[Attribute::RegenerateMana as usize] = mana_secs.max(0);
        self
    }

    /// Current value
    pub fn get(&self, a: Attribute) -> i32 {
        self.values[a as usize]
    }

    /// Upper bound for `a`
    pub fn max_of(&self, a: Attribute) -> i32 {
        match a.max_attribute() {
            Some(m) => self.values[m as usize].max(0),
            None => i32::MAX,
        }
    }

    /// Overwrite a value, clamped to `[0, max]`
    pub fn set(&mut self, a: Attribute, value: i32) {
        self.values[a as usize] = value.clamp(0, self.max_of(a));
        if let Some(bounded) = bounded_by(a) {
            let max = self.max_of(bounded);
            let v = &mut self.values[bounded as usize];
            *v = (*v).min(max);
        }
    }

    /// Add `delta` and clamp to `[0, max]`, returning the new value
    pub fn change(&mut self, a: Attribute, delta: i32) -> i32 {
        let value = self.values[a as usize].saturating_add(delta);
        self.set(a, value);
        self.values[a as usize]
    }

    /// Protection value
    pub fn protection(&self, p: Protection) -> i32 {
        self.protections[p as usize]
    }

    /// Change a protection value; protections are not clamped
    pub fn change_protection(&mut self, p: Protection, value: i32) {
        self.protections[p as usize] = value;
    }

    /// Talent skill level, 0 for unknown talents
    pub fn talent_skill(&self, t: Talent) -> i32 {
        self.talent_skill.get(t.0 as usize).copied().unwrap_or(0)
    }

    /// Set a talent skill level
    pub fn set_talent_skill(&mut self, t: Talent, level: i32) {
        if let Some(slot) = self.talent_skill.get_mut(t.0 as usize) {
            *slot = level;
        }
    }

    /// Talent value (chance or percentage)
    pub fn talent_value(&self, t: Talent) -> i32 {
        self.talent_value.get(t.0 as usize).copied().unwrap_or(0)
    }

    /// Set a talent value
    pub fn set_talent_value(&mut self, t: Talent, value: i32) {
        if let Some(slot) = self.talent_value.get_mut(t.0 as usize) {
            *slot = value;
        }
    }

    /// Regenerate hitpoints and mana for `dt_ms` of elapsed time
    pub fn tick_regen(&mut self, dt_ms: u64) {
        let hp_period = self.get(Attribute::RegenerateHp);
        let points = regen_points(&mut self.regen_hp_ms, hp_period, dt_ms);
        if points > 0 && self.get(Attribute::Hitpoints) > 0 {
            self.change(Attribute::Hitpoints, points);
        }

        let mana_period = self.get(Attribute::RegenerateMana);
        let points = regen_points(&mut self.regen_mana_ms, mana_period, dt_ms);
        if points > 0 {
            self.change(Attribute::Mana, points);
        }
    }
}

/// Value whose bound is `a`
fn bounded_by(a: Attribute) -> Option<Attribute> {
    match a {
        Attribute::HitpointsMax => Some(Attribute::Hitpoints),
        Attribute::ManaMax => Some(Attribute::Mana),
        _ => None,
    }
}

fn regen_points(acc: &mut u64, period_secs: i32, dt_ms: u64) -> i32 {
    if period_secs <= 0 {
        *acc = 0;
        return 0;
    }
    let period = period_secs as u64 * 1000;
    *acc += dt_ms;
    let points = *acc / period;
    *acc %= period;
    points.min(i32::MAX as u64) as i32
}
