pub mod backend;
pub mod hotels;
pub mod images;

pub use backend::{HttpPlannerBackend, PlannerBackend};
pub use hotels::{HotelProvider, HttpHotelProvider, mock_hotels, normalize_hotel};
pub use images::{DEFAULT_HERO_IMAGE, HttpImageSearch, ImageHit, ImageSearch, hero_image};
