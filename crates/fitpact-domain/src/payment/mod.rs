mod gateway;

pub use gateway::{ExternalRefund, PaymentCallback, PaymentGateway, PaymentIntent, PaymentOutcome};
