pub mod positional;
pub mod selector;

pub use positional::evaluate;
pub use selector::{
    Candidate, MoveSelector, PositionalSelector, enumerate_candidates, select_candidate,
};
