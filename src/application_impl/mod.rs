mod registration_service_impl;

pub use registration_service_impl::*;
