// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! looper-piface: pipeline-interface parsing, resources, and routing

mod interface;
mod protocol;
mod resources;
mod router;

pub use interface::{
    ComputeSection, PifaceError, PipelineInterface, PipelineLevel, PreSubmit, ProtocolMapping,
    SchemaKind, SectionDef,
};
pub use protocol::{normalize_protocol, protocols_match};
pub use resources::{choose_resource_package, load_resource_table, ResourceError, ResourceRow};
pub use router::{Router, RouterError};
