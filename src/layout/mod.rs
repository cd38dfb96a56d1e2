//! Force-directed layout: the forces and the step/integrate loop.

pub mod forces;
pub mod simulation;
