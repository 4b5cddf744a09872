mod auth;
mod item_management;
mod item_search;
mod region_management;

pub use auth::Landing;
pub use item_management::ItemManagement;
pub use item_search::ItemSearch;
pub use region_management::RegionManagement;
