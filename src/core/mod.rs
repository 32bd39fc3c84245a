pub mod cancel;
pub mod domain;
pub mod pipeline;
pub mod traits;
pub mod validation;
