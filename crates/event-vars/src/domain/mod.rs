//! Domain layer: event variables, their typed overlay and observer bindings.

pub mod binding;
pub mod param_variable;
pub mod variable;

pub use binding::{BindingId, BindingToken, Observer};
pub use param_variable::ParamVariable;
pub use variable::EventVariable;
