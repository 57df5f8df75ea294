pub mod building;
pub mod event;
pub mod inventory;
pub mod island;
pub mod player;
pub mod production;
pub mod registry;
pub mod resource;
pub mod settlement;
pub mod terrain;
pub mod tile_map;
pub mod traits;
pub mod world;

pub use building::{Building, BuildingKind, BuildingType, BuildingTypeId, Rect};
pub use event::{Event, EventKind, EventLog};
pub use inventory::{Inventory, UNLIMITED};
pub use island::Island;
pub use player::{Player, Ship};
pub use production::{LineId, Producer, ProducerKey, ProductionLine, ProductionState};
pub use registry::{BuildingRegistry, RegistryError};
pub use resource::ResourceId;
pub use settlement::Settlement;
pub use terrain::{Edge, Ground, Shell};
pub use traits::{HasInventory, HasOwner, HasProductionState};
pub use world::World;
