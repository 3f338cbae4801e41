pub mod bus;
pub mod catalog;
pub mod error;
pub mod events;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod payment;
pub mod ports;
pub mod schema;
pub mod store;

pub use error::PaymentError;
pub use events::{PaymentConfirmed, PaymentEvent, PaymentRequested};
pub use payment::{Payment, PaymentStatus};
