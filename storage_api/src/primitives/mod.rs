//! Value types shared by the devicegraph and its callers.

pub mod region;
