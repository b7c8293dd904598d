//! `epi-contact` — who was near whom, and for how long.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`contact`]  | `Contact`: encounter runs with one peer                    |
//! | [`list`]     | `ContactList`: one agent's peer ledger                     |
//! | [`distance`] | cached distance matrix, per-region R-trees, radius queries |
//! | [`detector`] | `ContactDetector` model and its config                     |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Fill distance-matrix rows on Rayon's thread pool.       |
//! | `serde`    | `Serialize`/`Deserialize` for `DetectorConfig`.         |

pub mod contact;
pub mod detector;
pub mod distance;
pub mod list;


pub use contact::Contact;
pub use detector::{ContactDetector, DetectorConfig};
pub use distance::{
    DistanceMatrix, Proximity, RegionIndex, distance_matrix, neighbours_within, pairs_in_annulus,
    region_index,
};
pub use list::ContactList;

/// Names of the columns owned by the detector.
pub mod columns {
    /// `Vec<AgentId>`: exact neighbours at the current tick.
    pub const CONTACTS_NOW: &str = "contacts_now";
    /// `ContactList`: the noisy app ledger.
    pub const CONTACTS: &str = "contacts";
}
