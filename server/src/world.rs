use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    BulletId, BulletState, GrenadeId, GrenadeState, PlayerId, PlayerState, Vec3,
    ARENA_HALF_EXTENT, MAX_HEALTH, PLAYER_COLORS, SPAWN_EYE_HEIGHT,
};
use std::collections::HashMap;

/// Result of applying damage to a live player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub health: i32,
    pub lethal: bool,
}

/// Point-in-time copy of every entity, used to bootstrap new clients.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub players: HashMap<PlayerId, PlayerState>,
    pub bullets: HashMap<BulletId, BulletState>,
    pub grenades: HashMap<GrenadeId, GrenadeState>,
}

/// Canonical game state. All reads and writes happen on the main server
/// task, so none of this needs locking.
#[derive(Debug)]
pub struct World {
    pub players: HashMap<PlayerId, PlayerState>,
    pub bullets: HashMap<BulletId, BulletState>,
    pub grenades: HashMap<GrenadeId, GrenadeState>,
    next_bullet_id: BulletId,
    next_grenade_id: GrenadeId,
    rng: StdRng,
}

impl World {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic spawn positions and colors, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            players: HashMap::new(),
            bullets: HashMap::new(),
            grenades: HashMap::new(),
            next_bullet_id: 1,
            next_grenade_id: 1,
            rng,
        }
    }

    pub fn spawn_player(&mut self, id: PlayerId) -> PlayerState {
        let x = self.rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT);
        let z = self.rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT);
        let color = PLAYER_COLORS[self.rng.gen_range(0..PLAYER_COLORS.len())];

        let player = PlayerState::new(id, x, SPAWN_EYE_HEIGHT, z, color);
        info!("Spawned player {} at ({:.1}, {:.1})", id, x, z);
        self.players.insert(id, player.clone());
        player
    }

    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        let removed = self.players.remove(&id).is_some();
        if removed {
            info!("Removed player {}", id);
        }
        removed
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    /// Overwrites the player's position and yaw. Client-reported values
    /// win unconditionally, including while the player is dead.
    pub fn move_player(&mut self, id: PlayerId, x: f32, y: f32, z: f32, rotation: f32) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.x = x;
                player.y = y;
                player.z = z;
                player.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Subtracts `amount` from the player's health, clamped to `[0, MAX_HEALTH]`.
    /// A player already at zero takes no further damage until respawned.
    pub fn apply_damage(&mut self, id: PlayerId, amount: i32) -> Option<DamageResult> {
        let player = self.players.get_mut(&id)?;
        if player.health == 0 {
            return Some(DamageResult {
                health: 0,
                lethal: false,
            });
        }
        let health = (player.health - amount).clamp(0, MAX_HEALTH);
        player.health = health;
        Some(DamageResult {
            health,
            lethal: health == 0,
        })
    }

    /// Restores full health, but only for a dead player. Position is left
    /// where the client last reported it.
    pub fn respawn(&mut self, id: PlayerId) -> bool {
        match self.players.get_mut(&id) {
            Some(player) if player.health == 0 => {
                player.health = MAX_HEALTH;
                info!("Player {} respawned", id);
                true
            }
            _ => false,
        }
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.players.get(&id).map_or(false, |p| p.health > 0)
    }

    pub fn alive_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.health > 0)
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn add_bullet(
        &mut self,
        owner_id: PlayerId,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        damage: i32,
        weapon_type: String,
    ) -> BulletState {
        let id = self.next_bullet_id;
        self.next_bullet_id += 1;

        let bullet = BulletState {
            id,
            owner_id,
            origin,
            direction,
            speed,
            damage,
            weapon_type,
        };
        self.bullets.insert(id, bullet.clone());
        bullet
    }

    pub fn remove_bullet(&mut self, id: BulletId) -> bool {
        self.bullets.remove(&id).is_some()
    }

    pub fn bullet(&self, id: BulletId) -> Option<&BulletState> {
        self.bullets.get(&id)
    }

    pub fn add_grenade(&mut self, owner_id: PlayerId, position: Vec3, velocity: Vec3) -> GrenadeState {
        let id = self.next_grenade_id;
        self.next_grenade_id += 1;

        let grenade = GrenadeState {
            id,
            owner_id,
            position,
            velocity,
        };
        self.grenades.insert(id, grenade.clone());
        grenade
    }

    pub fn remove_grenade(&mut self, id: GrenadeId) -> bool {
        self.grenades.remove(&id).is_some()
    }

    pub fn grenade(&self, id: GrenadeId) -> Option<&GrenadeState> {
        self.grenades.get(&id)
    }

    /// Players within `radius` of `center`, closest first.
    pub fn players_within(&self, center: Vec3, radius: f32) -> Vec<(PlayerId, f32)> {
        let mut found: Vec<(PlayerId, f32)> = self
            .players
            .values()
            .map(|p| (p.id, center.distance_to(&p.position())))
            .filter(|(_, distance)| *distance <= radius)
            .collect();
        found.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        found
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.clone(),
            bullets: self.bullets.clone(),
            grenades: self.grenades.clone(),
        }
    }
}
