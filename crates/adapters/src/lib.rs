// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for external I/O
//!
//! Seams to the three external collaborators: the remote tunnel service
//! (behind [`TunnelFactory`]), the container runtime (behind
//! [`ContainerInspector`]), and local TCP probing (behind
//! [`ProtocolDetector`]).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod detect;
pub mod tunnel;

pub use container::{ContainerError, ContainerInfo, ContainerInspector, DockerInspector};
pub use detect::{NetProtocolDetector, ProtocolCaps, ProtocolDetector};
pub use tunnel::{
    AgentEvent, AgentOptions, Forwarder, ForwarderOptions, NoopTunnelFactory, TunnelAgent,
    TunnelError, TunnelFactory, Upstream,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use container::FakeContainerInspector;
#[cfg(any(test, feature = "test-support"))]
pub use detect::FakeProtocolDetector;
#[cfg(any(test, feature = "test-support"))]
pub use tunnel::{FakeTunnelFactory, ForwardCall, RecordedAgentOptions};
