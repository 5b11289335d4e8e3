mod model_loaders;

pub use model_loaders::{
    load_shipment_middleware, load_support_ticket_middleware, load_tracking_event_middleware,
};
