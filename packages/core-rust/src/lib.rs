//! Switchboard Core — operation identifiers, the operation registry, and the
//! request/response envelope shared by the assembly and transport layers.

pub mod operation;
pub mod registry;

pub use operation::{OperationId, Request, Response};
pub use registry::OperationRegistry;

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
