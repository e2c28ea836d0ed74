use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_HEALTH: i32 = 100;
pub const ARENA_HALF_EXTENT: f32 = 20.0;
pub const SPAWN_EYE_HEIGHT: f32 = 1.7;
pub const MAX_UNATTRIBUTED_DAMAGE: i32 = 100;

/// Spawn tints handed out at connect time, packed 0xRRGGBB.
pub const PLAYER_COLORS: [u32; 8] = [
    0xe6194b, 0x3cb44b, 0xffe119, 0x4363d8, 0xf58231, 0x911eb4, 0x46f0f0, 0xf032e6,
];

pub type PlayerId = u32;
pub type BulletId = u64;
pub type GrenadeId = u64;

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns the unit-length version of this vector.
    /// The zero vector normalizes to itself.
    pub fn normalized(&self) -> Vec3 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vec3::default()
        } else {
            Vec3 {
                x: self.x / mag,
                y: self.y / mag,
                z: self.z / mag,
            }
        }
    }

    pub fn distance_to(&self, other: &Vec3) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
    pub health: i32,
    pub color: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, x: f32, y: f32, z: f32, color: u32) -> Self {
        Self {
            id,
            x,
            y,
            z,
            rotation: 0.0,
            health: MAX_HEALTH,
            color,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulletState {
    pub id: BulletId,
    pub owner_id: PlayerId,
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: i32,
    pub weapon_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrenadeState {
    pub id: GrenadeId,
    pub owner_id: PlayerId,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Events sent by clients, as JSON texts of the form
/// `{"type": "<name>", "data": {...}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Client-reported position and yaw, applied last-write-wins.
    Move { x: f32, y: f32, z: f32, rotation: f32 },
    /// Fire request carrying the full bullet descriptor.
    #[serde(rename_all = "camelCase")]
    Shoot {
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        damage: i32,
        weapon_type: String,
    },
    /// Client-reported hit of a bullet against a player.
    #[serde(rename_all = "camelCase")]
    Hit {
        player_id: PlayerId,
        bullet_id: BulletId,
        damage: i32,
    },
    /// A bullet expired against a wall or left the arena.
    #[serde(rename_all = "camelCase")]
    RemoveBullet { bullet_id: BulletId },
    ThrowGrenade { origin: Vec3, velocity: Vec3 },
    #[serde(rename_all = "camelCase")]
    ExplodeGrenade { grenade_id: GrenadeId, position: Vec3 },
    /// Valid only while dead.
    Respawn,
}

/// Events sent by the server. `Init` is unicast to a joining client;
/// everything else is an incremental fact broadcast.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full world snapshot sent once to bootstrap a new client.
    #[serde(rename_all = "camelCase")]
    Init {
        player_id: PlayerId,
        players: HashMap<PlayerId, PlayerState>,
        bullets: HashMap<BulletId, BulletState>,
        grenades: HashMap<GrenadeId, GrenadeState>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player_id: PlayerId,
        player: PlayerState,
    },
    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        player_id: PlayerId,
        x: f32,
        y: f32,
        z: f32,
        rotation: f32,
    },
    #[serde(rename_all = "camelCase")]
    PlayerHit { player_id: PlayerId, health: i32 },
    #[serde(rename_all = "camelCase")]
    PlayerDied {
        player_id: PlayerId,
        killer_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerRespawned { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    BulletCreated {
        bullet_id: BulletId,
        bullet: BulletState,
    },
    #[serde(rename_all = "camelCase")]
    BulletRemoved { bullet_id: BulletId },
    #[serde(rename_all = "camelCase")]
    GrenadeThrown {
        grenade_id: GrenadeId,
        grenade: GrenadeState,
    },
    #[serde(rename_all = "camelCase")]
    GrenadeExploded { grenade_id: GrenadeId, position: Vec3 },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    GameOver { winner_id: PlayerId },
    Error { message: String },
}
