use std::collections::HashMap;
use std::time::Duration;

pub const GRENADE_DAMAGE: i32 = 80;
pub const GRENADE_RADIUS: f32 = 6.0;

/// Server-side caps for one weapon class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub damage: i32,
    pub fire_interval: Duration,
}

/// Immutable lookup table of weapon caps. Clients describe the bullets
/// they fire; this table bounds what those descriptions may claim.
#[derive(Debug, Clone)]
pub struct WeaponTable {
    weapons: HashMap<&'static str, WeaponSpec>,
    fallback: WeaponSpec,
}

impl WeaponTable {
    pub fn builtin() -> Self {
        let mut weapons = HashMap::new();
        weapons.insert(
            "pistol",
            WeaponSpec {
                damage: 15,
                fire_interval: Duration::from_millis(400),
            },
        );
        weapons.insert(
            "machinegun",
            WeaponSpec {
                damage: 8,
                fire_interval: Duration::from_millis(100),
            },
        );
        weapons.insert(
            "shotgun",
            WeaponSpec {
                damage: 30,
                fire_interval: Duration::from_millis(1000),
            },
        );

        Self {
            weapons,
            // Unrecognized weapon tags get conservative caps.
            fallback: WeaponSpec {
                damage: 25,
                fire_interval: Duration::from_millis(300),
            },
        }
    }

    pub fn get(&self, weapon_type: &str) -> &WeaponSpec {
        self.weapons.get(weapon_type).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, weapon_type: &str) -> bool {
        self.weapons.contains_key(weapon_type)
    }

    /// Caps a client-claimed damage value at the weapon's maximum.
    pub fn clamp_damage(&self, weapon_type: &str, claimed: i32) -> i32 {
        claimed.min(self.get(weapon_type).damage)
    }

    pub fn fire_interval(&self, weapon_type: &str) -> Duration {
        self.get(weapon_type).fire_interval
    }
}

/// Explosion damage falls off linearly with distance from the epicenter,
/// reaching zero at `radius`.
pub fn falloff_damage(base: i32, distance: f32, radius: f32) -> i32 {
    if radius <= 0.0 || distance >= radius {
        return 0;
    }
    let scale = 1.0 - distance / radius;
    (base as f32 * scale).round() as i32
}
