//! Client-side presentation state for the case list and detail screens.

pub mod case_view;
pub mod controller;
pub mod sort;
