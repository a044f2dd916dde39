//! Integration with the hosted-checkout payment processor.

pub mod events;
pub mod gateway;
pub mod signature;
pub mod stripe;

pub use gateway::{
    CheckoutSession, CheckoutSessionRequest, LineItemRequest, PaymentError, PaymentGateway,
    ProcessorProduct, SessionLineItem,
};
pub use stripe::StripeGateway;
