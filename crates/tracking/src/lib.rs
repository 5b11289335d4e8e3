pub mod generator;
pub mod journey;

pub use generator::{
    EventKind, GeneratedEvent, RouteInfo, TransportProfile, calculate_eta,
    generate_tracking_events, generate_tracking_number, is_international_route,
};
pub use journey::{
    Journey, JourneyEvent, JourneyStep, StepGlyph, StepKind, StepStatus, build_journey,
};
