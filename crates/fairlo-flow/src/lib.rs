//! The scan flow: state machine, session event loop, location resolution,
//! and the bridge to the cosmetic globe transition.
//!
//! [`controller::ScanFlowController`] is the sole authority over
//! [`fairlo_core::FlowState`]; every other component reports events that the
//! controller interprets. [`session::ScanSession`] runs the asynchronous
//! event loop that wires the controller to the camera manager, the
//! submission client, and the globe bridge, with stale-callback guards at
//! every resumption.

pub mod controller;
pub mod globe;
pub mod location;
pub mod session;

pub use controller::{Command, Effect, ScanFlowController};
pub use globe::{CosmeticGlobe, GlobeTransitionBridge, GlobeVisualization, ZoomComplete, ZoomDone};
pub use location::{
    LocationError, LocationProvider, LocationSource, ResolvedLocation, StaticLocationSource,
    UnsupportedLocationSource,
};
pub use session::{ScanSession, SessionHandle, Snapshot};
