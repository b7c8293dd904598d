//! `epi-world` — the spatial collaborator of the simulator.
//!
//! Geometry and movement are outside the epidemic core; the core only relies
//! on the [`World`] contract and on four population columns the world owns:
//!
//! | Column                        | Type       | Meaning                          |
//! |-------------------------------|------------|----------------------------------|
//! | [`columns::POSITION`]         | `Position` | current point in the plane       |
//! | [`columns::REGION`]           | `RegionId` | region the agent is currently in |
//! | [`columns::HOME`]             | `RegionId` | the agent's home region          |
//! | [`columns::MOVEMENT_ENABLED`] | `bool`     | motion mask honoured by `step`   |
//!
//! # Crate layout
//!
//! | Module     | Contents                                               |
//! |------------|--------------------------------------------------------|
//! | [`world`]  | `World` trait, `Destination`                           |
//! | [`region`] | `Region`, `RegionWorld` (rectangles + random walk)     |
//! | [`error`]  | `WorldError`, `WorldResult<T>`                         |

pub mod error;
pub mod region;
pub mod world;


pub use error::{WorldError, WorldResult};
pub use region::{Region, RegionWorld};
pub use world::{Destination, World};

/// Names of the columns owned by the world.
pub mod columns {
    pub const POSITION: &str = "position";
    pub const REGION: &str = "region";
    pub const HOME: &str = "home";
    pub const MOVEMENT_ENABLED: &str = "movement_enabled";
}
