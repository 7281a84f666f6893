//! Transport descriptors and the finalization handoff

pub mod descriptor;
pub mod finalizer;

pub use descriptor::{Component, DtlsParameters, DtlsRole, IceParameters, TransportDescriptor, TransportFlow};
pub use finalizer::{
    FinalizeOutcome, FinalizeRequest, SessionLiveness, TransportFinalizer, TransportHandler, TransportLayer,
};
