//! Characteristic notifications: who is listening, and getting values to
//! them under transport backpressure.

pub mod dispatcher;
pub mod subscriptions;
