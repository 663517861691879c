//! Variant resolution.
//!
//! Picks the download of a tool that applies to a node's platform. Catalog
//! order is authoritative: the first applicable variant wins.

use crate::error::Error;
use crate::manifest::{Manifest, ToolVariant};
use crate::platform::{OsFamily, PlatformSignature};
use std::fmt;

/// No variant of the requested tool applies to the node's platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    /// Requested tool id.
    pub tool_id: String,
    /// Raw OS name of the node.
    pub os_name: String,
    /// Raw architecture of the node.
    pub os_arch: String,
}

impl Unsupported {
    fn new(tool_id: &str, signature: &PlatformSignature) -> Self {
        Self {
            tool_id: tool_id.to_string(),
            os_name: signature.os_name.clone(),
            os_arch: signature.os_arch.clone(),
        }
    }

    /// Turn into a fatal error for the given node.
    #[must_use]
    pub fn on_node(self, node: &str) -> Error {
        Error::Unsupported {
            tool: self.tool_id,
            node: node.to_string(),
            os: self.os_name,
            arch: self.os_arch,
        }
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no download of `{}` known for OS `{}` and arch `{}`",
            self.tool_id, self.os_name, self.os_arch
        )
    }
}

/// Resolve the variant of `tool_id` that applies to `signature`.
pub fn resolve<'m>(
    manifest: &'m Manifest,
    tool_id: &str,
    signature: &PlatformSignature,
) -> Result<&'m ToolVariant, Unsupported> {
    let tool = manifest
        .find(tool_id)
        .ok_or_else(|| Unsupported::new(tool_id, signature))?;
    let family = signature
        .family()
        .ok_or_else(|| Unsupported::new(tool_id, signature))?;

    tool.variants
        .iter()
        .find(|variant| applies_to(variant, family, &signature.os_arch))
        .ok_or_else(|| Unsupported::new(tool_id, signature))
}

/// Whether a variant can be installed on a node of the given family and arch.
///
/// The download site publishes a single build per OS family, tagged with the
/// placeholder arch `-`, so any architecture is accepted once the OS matches.
/// Publishing per-architecture builds requires tightening this check.
fn applies_to(variant: &ToolVariant, family: OsFamily, _os_arch: &str) -> bool {
    variant.os_site_name == family.site_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::InstallableTool;

    fn variant(os: &str, url: &str) -> ToolVariant {
        ToolVariant {
            os_site_name: os.to_string(),
            arch_site_name: "-".to_string(),
            url: url.to_string(),
        }
    }

    fn ninja_manifest() -> Manifest {
        Manifest {
            tools: vec![InstallableTool {
                id: "ninja".to_string(),
                name: None,
                variants: vec![variant("linux", "A"), variant("win", "B"), variant("mac", "C")],
            }],
        }
    }

    #[test]
    fn test_resolve_linux() {
        let manifest = ninja_manifest();
        let signature = PlatformSignature::new("Linux", "amd64");
        assert_eq!(resolve(&manifest, "ninja", &signature).unwrap().url, "A");
    }

    #[test]
    fn test_resolve_windows_and_mac() {
        let manifest = ninja_manifest();
        let windows = PlatformSignature::new("Windows Server 2016", "x86");
        let mac = PlatformSignature::new("Mac OS X", "aarch64");
        assert_eq!(resolve(&manifest, "ninja", &windows).unwrap().url, "B");
        assert_eq!(resolve(&manifest, "ninja", &mac).unwrap().url, "C");
    }

    #[test]
    fn test_resolve_unknown_os_is_unsupported() {
        let manifest = ninja_manifest();
        let signature = PlatformSignature::new("FreeBSD", "x86");
        let unsupported = resolve(&manifest, "ninja", &signature).unwrap_err();
        assert_eq!(unsupported.tool_id, "ninja");
        assert_eq!(unsupported.os_name, "FreeBSD");
        assert_eq!(unsupported.os_arch, "x86");
    }

    #[test]
    fn test_resolve_unknown_tool_is_unsupported() {
        let manifest = ninja_manifest();
        let signature = PlatformSignature::new("Linux", "amd64");
        assert!(resolve(&manifest, "samurai", &signature).is_err());
    }

    #[test]
    fn test_resolve_empty_manifest_is_unsupported() {
        let signature = PlatformSignature::new("Linux", "amd64");
        assert!(resolve(&Manifest::empty(), "ninja", &signature).is_err());
    }

    #[test]
    fn test_resolve_family_without_variant() {
        let manifest = Manifest {
            tools: vec![InstallableTool {
                id: "ninja".to_string(),
                name: None,
                variants: vec![variant("linux", "A")],
            }],
        };
        let signature = PlatformSignature::new("Windows 10", "amd64");
        assert!(resolve(&manifest, "ninja", &signature).is_err());
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let manifest = Manifest {
            tools: vec![InstallableTool {
                id: "ninja".to_string(),
                name: None,
                variants: vec![variant("linux", "first"), variant("linux", "second")],
            }],
        };
        let signature = PlatformSignature::new("Linux", "amd64");
        assert_eq!(resolve(&manifest, "ninja", &signature).unwrap().url, "first");
    }

    #[test]
    fn test_resolve_ignores_architecture() {
        let manifest = ninja_manifest();
        for arch in ["amd64", "aarch64", "ppc64le", ""] {
            let signature = PlatformSignature::new("Linux", arch);
            assert_eq!(resolve(&manifest, "ninja", &signature).unwrap().url, "A");
        }
    }

    #[test]
    fn test_unsupported_on_node() {
        let manifest = ninja_manifest();
        let signature = PlatformSignature::new("SunOS", "sparcv9");
        let err = resolve(&manifest, "ninja", &signature)
            .unwrap_err()
            .on_node("solaris-agent");
        match err {
            Error::Unsupported { tool, node, os, arch } => {
                assert_eq!(tool, "ninja");
                assert_eq!(node, "solaris-agent");
                assert_eq!(os, "SunOS");
                assert_eq!(arch, "sparcv9");
            }
            other => panic!("Expected Error::Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_display() {
        let unsupported = Unsupported {
            tool_id: "ninja".to_string(),
            os_name: "AIX".to_string(),
            os_arch: "ppc64".to_string(),
        };
        let display = unsupported.to_string();
        assert!(display.contains("AIX"));
        assert!(display.contains("ppc64"));
    }
}
