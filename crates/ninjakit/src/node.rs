//! Requests executed on build nodes.
//!
//! Work that has to happen on the node itself is expressed as a
//! [`NodeRequest`] answered by a [`NodeResponse`]. Both are plain serializable
//! values; nothing else crosses the boundary. [`handle`] is the node-side
//! executor, [`LocalNode`] runs it in-process for the machine this code runs
//! on.

use crate::error::{Error, Result};
use crate::layout;
use crate::platform::PlatformSignature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Property key of the operating system name.
pub const OS_NAME: &str = "os.name";

/// Property key of the CPU architecture.
pub const OS_ARCH: &str = "os.arch";

/// A request dispatched to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRequest {
    /// Read system properties.
    SystemProperties {
        /// Property keys, answered in the same order.
        keys: Vec<String>,
    },
    /// Mark every regular file below `dir` executable.
    MakeExecutable {
        /// Directory on the node.
        dir: PathBuf,
    },
}

/// A node's answer to a [`NodeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeResponse {
    /// Property values; `None` for unknown keys.
    SystemProperties {
        /// Values in request order.
        values: Vec<Option<String>>,
    },
    /// The request completed without a value.
    Done,
}

/// A machine the tool can be provisioned onto.
pub trait Node: Send + Sync {
    /// Display name of the node.
    fn name(&self) -> &str;

    /// Root of the node's shared tool installation area.
    fn tools_root(&self) -> &Path;

    /// Execute `request` on the node and wait for the answer.
    fn call(&self, request: NodeRequest) -> Result<NodeResponse>;
}

/// Execute a request on the current machine.
pub fn handle(request: NodeRequest) -> Result<NodeResponse> {
    match request {
        NodeRequest::SystemProperties { keys } => {
            let properties = system_properties();
            let values = keys.iter().map(|key| properties.get(key).cloned()).collect();
            Ok(NodeResponse::SystemProperties { values })
        }
        NodeRequest::MakeExecutable { dir } => {
            layout::make_executable(&dir)?;
            Ok(NodeResponse::Done)
        }
    }
}

fn system_properties() -> HashMap<String, String> {
    let signature = crate::platform::detect();
    HashMap::from([
        (OS_NAME.to_string(), signature.os_name),
        (OS_ARCH.to_string(), signature.os_arch),
    ])
}

/// Ask `node` for its platform signature.
pub fn query_node_properties(node: &dyn Node) -> Result<PlatformSignature> {
    let request = NodeRequest::SystemProperties {
        keys: vec![OS_NAME.to_string(), OS_ARCH.to_string()],
    };

    match node.call(request)? {
        NodeResponse::SystemProperties { values } => {
            let mut values = values.into_iter();
            let os_name = values.next().flatten().unwrap_or_default();
            let os_arch = values.next().flatten().unwrap_or_default();
            Ok(PlatformSignature::new(os_name, os_arch))
        }
        other => Err(unexpected(node, &other)),
    }
}

/// Ask `node` to mark everything below `dir` executable.
pub fn make_executable(node: &dyn Node, dir: &Path) -> Result<()> {
    let request = NodeRequest::MakeExecutable {
        dir: dir.to_path_buf(),
    };

    match node.call(request)? {
        NodeResponse::Done => Ok(()),
        other => Err(unexpected(node, &other)),
    }
}

fn unexpected(node: &dyn Node, response: &NodeResponse) -> Error {
    Error::Node {
        node: node.name().to_string(),
        message: format!("unexpected response {response:?}"),
    }
}

/// The machine this process runs on.
#[derive(Debug, Clone)]
pub struct LocalNode {
    name: String,
    tools_root: PathBuf,
}

impl LocalNode {
    /// Create a local node installing tools below `tools_root`.
    #[must_use]
    pub fn new(name: impl Into<String>, tools_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            tools_root: tools_root.into(),
        }
    }
}

impl Node for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn tools_root(&self) -> &Path {
        &self.tools_root
    }

    fn call(&self, request: NodeRequest) -> Result<NodeResponse> {
        handle(request)
    }
}
