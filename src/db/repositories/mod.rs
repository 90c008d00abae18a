pub mod cameras;
pub mod incidents;

pub use cameras::CamerasRepository;
pub use incidents::IncidentsRepository;
